mod job;

pub use job::{Job, JobType};
