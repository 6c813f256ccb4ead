//! Game events — синхронный broadcast без payload
//!
//! Архитектура:
//! - EventBus владеет composition root (App), передаётся подписчикам явно
//! - Два trigger'а (PlayerJump, PlayerDied), у каждого свой список подписчиков
//! - subscribe() возвращает Subscription guard: drop = unsubscribe
//!
//! Подписка живёт ровно столько, сколько guard. Подписчик не может
//! "забыть отписаться" — owner дропнулся, callback больше не вызывается.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};


/// Именованный trigger (zero-argument, fire-and-forget)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameTrigger {
    /// Jump key нажат (raise: InputReader)
    PlayerJump,
    /// Игрок упал ниже death height (raise: MovementController, каждый step)
    PlayerDied,
}

impl GameTrigger {
    pub const ALL: [GameTrigger; 2] = [GameTrigger::PlayerJump, GameTrigger::PlayerDied];

    pub fn name(&self) -> &'static str {
        match self {
            GameTrigger::PlayerJump => "PlayerJump",
            GameTrigger::PlayerDied => "PlayerDied",
        }
    }

    fn index(self) -> usize {
        match self {
            GameTrigger::PlayerJump => 0,
            GameTrigger::PlayerDied => 1,
        }
    }
}

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    /// Индекс = GameTrigger::index(), порядок внутри = порядок подписки
    subscribers: [Vec<(u64, Callback)>; 2],
}

impl BusInner {
    fn remove(&mut self, trigger: GameTrigger, id: u64) -> Option<Callback> {
        let list = &mut self.subscribers[trigger.index()];
        let position = list.iter().position(|(entry_id, _)| *entry_id == id)?;
        Some(list.remove(position).1)
    }
}

/// Шина событий (cheap clone handle)
///
/// Single-threaded: Rc внутри, в Bevy хранится как non-send resource.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет подписчика в конец списка trigger'а
    pub fn subscribe<F>(&self, trigger: GameTrigger, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers[trigger.index()].push((id, Rc::new(callback)));

        Subscription {
            bus: Rc::downgrade(&self.inner),
            trigger,
            id,
        }
    }

    /// Вызывает всех текущих подписчиков синхронно, в порядке подписки
    ///
    /// Dispatch идёт по snapshot'у списка: subscribe/unsubscribe из callback'а
    /// вступают в силу со следующего raise.
    pub fn raise(&self, trigger: GameTrigger) {
        let snapshot: Vec<Callback> = self.inner.borrow().subscribers[trigger.index()]
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in snapshot {
            callback();
        }
    }

    pub fn subscriber_count(&self, trigger: GameTrigger) -> usize {
        self.inner.borrow().subscribers[trigger.index()].len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for trigger in GameTrigger::ALL {
            map.entry(&trigger.name(), &self.subscriber_count(trigger));
        }
        map.finish()
    }
}

/// Scoped регистрация подписчика
///
/// Drop (или release()) убирает callback из шины. Если шина уже
/// уничтожена — no-op.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    trigger: GameTrigger,
    id: u64,
}

impl Subscription {
    pub fn trigger(&self) -> GameTrigger {
        self.trigger
    }

    /// Явная отписка (эквивалент drop)
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };

        // Callback дропаем после borrow: он может владеть другой Subscription
        let removed = inner.borrow_mut().remove(self.trigger, self.id);
        drop(removed);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("trigger", &self.trigger)
            .field("id", &self.id)
            .finish()
    }
}
