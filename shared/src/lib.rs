pub mod ids;
pub mod job;
pub mod pixel;
pub mod queue;
pub mod responses;
pub mod tracer;
