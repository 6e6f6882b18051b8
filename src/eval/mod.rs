pub mod context;
pub mod expression;
pub mod value;

pub use context::{Environment, Scoped, Variables};
pub use expression::{apply_binary, evaluate, range_bounds, ExpressionEvaluator, MAX_RANGE_LEN};
pub use value::Value;
