use serde::{Deserialize, Serialize};

use crate::app::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionCategory {
    Base,
    Static,
    Moving,
    Player,
}

const CATEGORY_COUNT: usize = 4;

impl CollisionCategory {
    pub const ALL: [CollisionCategory; CATEGORY_COUNT] = [
        CollisionCategory::Base,
        CollisionCategory::Static,
        CollisionCategory::Moving,
        CollisionCategory::Player,
    ];

    const fn index(self) -> usize {
        match self {
            CollisionCategory::Base => 0,
            CollisionCategory::Static => 1,
            CollisionCategory::Moving => 2,
            CollisionCategory::Player => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// One side of a contact: what kind of body it is and which entity owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactBody {
    pub category: CollisionCategory,
    pub owner: EntityId,
}

/// A contact reported by one physics step. `total_impulse` is the impulse
/// accumulated over the whole contact during that step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: ContactBody,
    pub b: ContactBody,
    pub total_impulse: Vec2,
    pub is_first_contact: bool,
}

impl CollisionEvent {
    pub fn categories(&self) -> (CollisionCategory, CollisionCategory) {
        (self.a.category, self.b.category)
    }

    /// The first side carrying `category`, if either does.
    pub fn body_with_category(&self, category: CollisionCategory) -> Option<&ContactBody> {
        if self.a.category == category {
            Some(&self.a)
        } else if self.b.category == category {
            Some(&self.b)
        } else {
            None
        }
    }

    pub fn impulse_magnitude(&self) -> f32 {
        self.total_impulse.length()
    }
}

pub type CollisionHandler<C> = fn(&CollisionEvent, &mut C);

/// Handler table keyed on the unordered category pair of a contact.
pub struct CollisionDispatcher<C: ?Sized> {
    handlers: [[Option<CollisionHandler<C>>; CATEGORY_COUNT]; CATEGORY_COUNT],
}

impl<C: ?Sized> CollisionDispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: [[None; CATEGORY_COUNT]; CATEGORY_COUNT],
        }
    }

    /// Registers `handler` for both `(a, b)` and `(b, a)`, replacing any
    /// previous handler for the pair.
    pub fn register(
        &mut self,
        a: CollisionCategory,
        b: CollisionCategory,
        handler: CollisionHandler<C>,
    ) {
        self.handlers[a.index()][b.index()] = Some(handler);
        self.handlers[b.index()][a.index()] = Some(handler);
    }

    pub fn is_registered(&self, a: CollisionCategory, b: CollisionCategory) -> bool {
        self.handlers[a.index()][b.index()].is_some()
    }

    /// Runs the handler for the event's category pair. Returns `false` when
    /// the pair has none.
    pub fn dispatch(&self, event: &CollisionEvent, ctx: &mut C) -> bool {
        match self.handlers[event.a.category.index()][event.b.category.index()] {
            Some(handler) => {
                handler(event, ctx);
                true
            }
            None => false,
        }
    }
}

impl<C: ?Sized> Default for CollisionDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for CollisionDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        calls: Vec<(CollisionCategory, CollisionCategory)>,
    }

    fn record(event: &CollisionEvent, log: &mut Log) {
        log.calls.push(event.categories());
    }

    fn event(a: CollisionCategory, b: CollisionCategory) -> CollisionEvent {
        CollisionEvent {
            a: ContactBody {
                category: a,
                owner: EntityId(1),
            },
            b: ContactBody {
                category: b,
                owner: EntityId(2),
            },
            total_impulse: Vec2::new(3.0, 4.0),
            is_first_contact: true,
        }
    }

    #[test]
    fn register_covers_both_orders() {
        let mut dispatcher = CollisionDispatcher::<Log>::new();
        dispatcher.register(CollisionCategory::Player, CollisionCategory::Static, record);
        let mut log = Log::default();

        assert!(dispatcher.dispatch(
            &event(CollisionCategory::Player, CollisionCategory::Static),
            &mut log
        ));
        assert!(dispatcher.dispatch(
            &event(CollisionCategory::Static, CollisionCategory::Player),
            &mut log
        ));
        assert_eq!(log.calls.len(), 2);
    }

    #[test]
    fn unregistered_pairs_are_ignored() {
        let mut dispatcher = CollisionDispatcher::<Log>::new();
        dispatcher.register(CollisionCategory::Player, CollisionCategory::Static, record);
        let mut log = Log::default();

        for a in CollisionCategory::ALL {
            for b in CollisionCategory::ALL {
                let expected = matches!(
                    (a, b),
                    (CollisionCategory::Player, CollisionCategory::Static)
                        | (CollisionCategory::Static, CollisionCategory::Player)
                );
                assert_eq!(dispatcher.dispatch(&event(a, b), &mut log), expected);
                assert_eq!(dispatcher.is_registered(a, b), expected);
            }
        }
        assert_eq!(log.calls.len(), 2);
    }

    #[test]
    fn body_with_category_finds_either_side() {
        let e = event(CollisionCategory::Moving, CollisionCategory::Player);
        assert_eq!(
            e.body_with_category(CollisionCategory::Player).map(|b| b.owner),
            Some(EntityId(2))
        );
        assert_eq!(
            e.body_with_category(CollisionCategory::Moving).map(|b| b.owner),
            Some(EntityId(1))
        );
        assert!(e.body_with_category(CollisionCategory::Base).is_none());
        assert_eq!(e.impulse_magnitude(), 5.0);
    }

    #[test]
    fn category_names_are_snake_case() {
        let parsed: CollisionCategory = serde_json::from_str("\"moving\"").expect("category");
        assert_eq!(parsed, CollisionCategory::Moving);
    }
}
