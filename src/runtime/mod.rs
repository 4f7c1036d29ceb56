mod contexts;
mod queue;
#[cfg(test)]
mod tests;

pub use contexts::ExecutionContexts;
pub use queue::TaskQueue;
