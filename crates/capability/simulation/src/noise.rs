//! 噪声源：生产环境使用随机数，测试使用确定性序列。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 均匀整数噪声，区间两端均包含。
pub trait NoiseSource: Send {
    fn draw(&mut self, low: i32, high: i32) -> i32;
}

/// 基于 `StdRng` 的随机噪声。
pub struct RandomNoise {
    rng: StdRng,
}

impl RandomNoise {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for RandomNoise {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// 按顺序循环返回给定值，并夹到请求区间内。
#[derive(Debug, Clone)]
pub struct SequenceNoise {
    values: Vec<i32>,
    cursor: usize,
}

impl SequenceNoise {
    pub fn new(values: Vec<i32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// 始终返回同一个值。
    pub fn constant(value: i32) -> Self {
        Self::new(vec![value])
    }
}

impl NoiseSource for SequenceNoise {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        if self.values.is_empty() {
            return low;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value.clamp(low, high.max(low))
    }
}
