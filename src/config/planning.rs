//! Parámetros de síntesis de rutas

use chrono::{Duration, NaiveTime};

/// Minutos estimados por parada
pub const DEFAULT_MINUTES_PER_STOP: i64 = 45;

/// Constantes usadas por el constructor de rutas
#[derive(Debug, Clone)]
pub struct PlanningConfig {
    pub minutes_per_stop: i64,
    /// Hora de llegada prevista a la primera parada
    pub day_start: NaiveTime,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            minutes_per_stop: DEFAULT_MINUTES_PER_STOP,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl PlanningConfig {
    /// Franja estimada de llegada a la parada `index` (base cero)
    pub fn eta_for_stop(&self, index: usize) -> NaiveTime {
        let offset = Duration::minutes(self.minutes_per_stop * index as i64);
        self.day_start.overflowing_add_signed(offset).0
    }

    pub fn estimated_duration_minutes(&self, stop_count: usize) -> i32 {
        (self.minutes_per_stop * stop_count as i64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_slots_are_45_minutes_apart() {
        let config = PlanningConfig::default();
        assert_eq!(config.eta_for_stop(0), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.eta_for_stop(2), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.estimated_duration_minutes(3), 135);
    }
}
