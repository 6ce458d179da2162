//! Elastic pool sizing heuristic.
//!
//! Each tick compares queue depth with the number of idle workers:
//! - empty queue, or fewer pending tasks than idle workers: shrink by `step`
//! - more than `growth_factor` pending tasks per idle worker: grow by `step`
//! - anything else: leave the pool alone
//!
//! Both directions are clamped to `[min, max]`, so a partial step is taken
//! near a bound.

use crate::PoolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    Grow(usize),
    Shrink(usize),
    Hold,
}

#[derive(Debug, Clone, Copy)]
pub struct SizeController {
    min: usize,
    max: usize,
    step: usize,
    growth_factor: usize,
}

impl SizeController {
    pub fn new(
        min: usize,
        max: usize,
        step: usize,
        growth_factor: usize,
    ) -> Self {
        Self {
            min,
            max,
            step,
            growth_factor,
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(
            config.min_workers,
            config.max_workers,
            config.step,
            config.growth_factor,
        )
    }

    pub fn decide(
        &self,
        pending: usize,
        idle: usize,
        current: usize,
    ) -> ResizeDecision {
        if pending == 0 || pending < idle {
            let n = self.step.min(current.saturating_sub(self.min));
            return if n == 0 {
                ResizeDecision::Hold
            } else {
                ResizeDecision::Shrink(n)
            };
        }

        if pending > idle.saturating_mul(self.growth_factor) {
            let n = self.step.min(self.max.saturating_sub(current));
            return if n == 0 {
                ResizeDecision::Hold
            } else {
                ResizeDecision::Grow(n)
            };
        }

        ResizeDecision::Hold
    }
}
