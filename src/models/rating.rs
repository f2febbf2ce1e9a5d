// 评分步进：所有评分归一化都经过这里

/// 评分上限（以 0.1 为单位）
const MAX_TENTHS: u8 = 100;

/// IMDb 评分步进器，[0.0, 10.0]，步长 0.1
///
/// Held as an integer count of tenths so repeated steps never drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingStepper {
    tenths: u8,
}

impl RatingStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest step to `value`, clamped into range. NaN maps to 0.0.
    pub fn from_value(value: f64) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        let tenths = (value * 10.0).round().clamp(0.0, MAX_TENTHS as f64) as u8;
        Self { tenths }
    }

    pub fn value(&self) -> f64 {
        self.tenths as f64 / 10.0
    }

    pub fn increment(&mut self) -> f64 {
        self.tenths = (self.tenths + 1).min(MAX_TENTHS);
        self.value()
    }

    pub fn decrement(&mut self) -> f64 {
        self.tenths = self.tenths.saturating_sub(1);
        self.value()
    }
}
