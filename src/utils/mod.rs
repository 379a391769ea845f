pub mod time;

/// Generates a long unique id (flows, executions).
pub fn longid() -> String {
    nanoid::nanoid!()
}

