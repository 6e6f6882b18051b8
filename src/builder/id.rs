use uuid::Uuid;

/// Source of ids for agents written without `#id`.
pub trait IdGenerator {
    /// `kind` is the agent kind (`text`, `button`, `image`, `video`).
    fn next_id(&mut self, kind: &str) -> String;
}

/// Random v4 uuids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self, _kind: &str) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `text_1`, `button_2`, ... with one counter shared by all kinds.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    counter: u64,
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, kind: &str) -> String {
        self.counter += 1;
        format!("{}_{}", kind, self.counter)
    }
}
