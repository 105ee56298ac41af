use std::cell::RefCell;
use std::rc::Rc;

/// Identifier of the object currently under the pointer, if any.
///
/// Cloning yields another handle to the same value. The event loop is
/// single threaded and pointer events are dispatched one at a time, so
/// writes are simply last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    hovered: Rc<RefCell<Option<String>>>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hovered_object(&self, id: Option<&str>) {
        let mut hovered = self.hovered.borrow_mut();
        if hovered.as_deref() != id {
            log::debug!("Hovered object: {:?}", id);
        }
        *hovered = id.map(str::to_owned);
    }

    pub fn hovered_object(&self) -> Option<String> {
        self.hovered.borrow().clone()
    }

    /// Runs `f` with a borrowed view of the hovered id without cloning it.
    pub fn with_hovered<R>(&self, f: impl FnOnce(Option<&str>) -> R) -> R {
        f(self.hovered.borrow().as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert_eq!(InteractionState::new().hovered_object(), None);
    }

    #[test]
    fn set_then_clear() {
        let state = InteractionState::new();
        state.set_hovered_object(Some("orb"));
        assert_eq!(state.hovered_object().as_deref(), Some("orb"));

        state.set_hovered_object(None);
        assert_eq!(state.hovered_object(), None);
    }

    #[test]
    fn last_write_wins() {
        let state = InteractionState::new();
        state.set_hovered_object(Some("orb"));
        state.set_hovered_object(Some("logo"));
        assert_eq!(state.hovered_object().as_deref(), Some("logo"));
    }

    #[test]
    fn clones_share_the_same_value() {
        let writer = InteractionState::new();
        let reader = writer.clone();

        writer.set_hovered_object(Some("orb"));
        reader.with_hovered(|id| assert_eq!(id, Some("orb")));
    }
}
