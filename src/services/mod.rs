pub mod aggregator;
pub mod journal;
pub mod router;
pub mod scheduler;
pub mod smoother;

#[cfg(test)]
mod router_tests;
#[cfg(test)]
mod smoother_tests;
