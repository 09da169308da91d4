use crate::models::Action;

/// Whether a new action differs from the stored one. With no stored action
/// (first evaluation for that actuator) this is always true.
pub fn has_action_changed(previous: Option<Action>, new: Action) -> bool {
    match previous {
        None => true,
        Some(previous) => previous != new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_to_on_and_back() {
        assert!(has_action_changed(Some(Action::Off), Action::On));
        assert!(has_action_changed(Some(Action::On), Action::Off));
    }

    #[test]
    fn unchanged() {
        assert!(!has_action_changed(Some(Action::On), Action::On));
        assert!(!has_action_changed(Some(Action::Off), Action::Off));
    }

    #[test]
    fn no_previous_action() {
        assert!(has_action_changed(None, Action::On));
        assert!(has_action_changed(None, Action::Off));
    }
}
