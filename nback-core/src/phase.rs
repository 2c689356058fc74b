/// Defines session phases and their behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_countdown(&self) -> bool {
        false
    }
    fn is_task(&self) -> bool {
        false
    }
    fn is_complete(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Countdown,
    Task,
    Complete,
}

impl Phase for TaskPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Task)
    }

    fn next(&self) -> Option<Self> {
        use TaskPhase::*;
        Some(match self {
            Countdown => Task,
            Task => Complete,
            Complete => return None,
        })
    }

    fn is_countdown(&self) -> bool {
        matches!(self, TaskPhase::Countdown)
    }

    fn is_task(&self) -> bool {
        matches!(self, TaskPhase::Task)
    }

    fn is_complete(&self) -> bool {
        matches!(self, TaskPhase::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let phase = TaskPhase::default();
        assert!(phase.is_countdown());
        let phase = phase.next().unwrap();
        assert!(phase.is_task());
        let phase = phase.next().unwrap();
        assert!(phase.is_complete());
        assert_eq!(phase.next(), None);
    }

    #[test]
    fn only_the_task_phase_takes_input() {
        assert!(!TaskPhase::Countdown.allows_input());
        assert!(TaskPhase::Task.allows_input());
        assert!(!TaskPhase::Complete.allows_input());
    }
}
