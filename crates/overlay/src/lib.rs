pub mod batch;
pub mod expectation;
pub mod gate;
pub mod scenario;

pub fn module_ready() -> bool {
    true
}
