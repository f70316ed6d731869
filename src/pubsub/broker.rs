use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use ahash::RandomState;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{intern_name, Callback, Channel, Listener, Message, Value};
use crate::error::BroadcastError;

type Registry = HashMap<Arc<str>, Vec<Listener>, RandomState>;

/// Брокер pub/sub: реестр каналов и синхронная доставка.
///
/// Поддерживает:
/// - Ленивое создание канала при первом `add`
/// - Вещание в порядке регистрации, всем слушателям один кортеж
/// - Снятие всех вхождений колбэка за один вызов `remove`
/// - Счётчики вещаний, доставок и отказов
///
/// Выбор канала не хранится в брокере: `channel` возвращает хендл,
/// несущий имя с собой, поэтому чередующиеся цепочки вызовов не видят
/// чужой выбор.
pub struct Broker {
    /// Имя канала → упорядоченный список слушателей.
    channels: Mutex<Registry>,
    /// Общее количество вызовов `broadcast`.
    pub broadcast_count: AtomicUsize,
    /// Количество успешных вызовов слушателей.
    pub delivered_count: AtomicUsize,
    /// Количество вещаний, прерванных ошибкой слушателя.
    pub failed_count: AtomicUsize,
}

impl Broker {
    /// Создаёт брокер с пустым реестром.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Registry::default()),
            broadcast_count: AtomicUsize::new(0),
            delivered_count: AtomicUsize::new(0),
            failed_count: AtomicUsize::new(0),
        }
    }

    /// Выбирает канал по имени и возвращает хендл для цепочки вызовов.
    ///
    /// Сам канал при этом не создаётся: он появится в реестре при
    /// первом `add`.
    pub fn channel(&self, name: impl AsRef<str>) -> Channel<'_> {
        Channel::new(self, intern_name(name))
    }

    /// Снимок всего реестра: имя канала → список слушателей.
    ///
    /// Возвращается копия (записи — дешёвые клоны `Arc`), так что
    /// состояние брокера через неё не изменить.
    pub fn all(&self) -> HashMap<Arc<str>, Vec<Listener>> {
        self.channels
            .lock()
            .iter()
            .map(|(name, entries)| (name.clone(), entries.clone()))
            .collect()
    }

    /// Количество слушателей канала; 0 для канала, который ещё
    /// не создавался.
    pub fn listener_count(&self, name: impl AsRef<str>) -> usize {
        self.channels.lock().get(name.as_ref()).map_or(0, Vec::len)
    }

    /// Имена каналов, на которых есть хотя бы один слушатель.
    pub fn active_channels(&self) -> Vec<Arc<str>> {
        self.channels
            .lock()
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Удаляет канал вместе со всеми слушателями.
    ///
    /// Возвращает `true`, если канал существовал. Это единственная
    /// операция, убирающая канал из реестра: `remove` оставляет после
    /// себя пустой список.
    pub fn clear(&self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        let removed = self.channels.lock().remove(name).is_some();
        if removed {
            debug!(channel = name, "channel cleared");
        }
        removed
    }

    pub(crate) fn add_entries(
        &self,
        name: &Arc<str>,
        specs: impl IntoIterator<Item = Listener>,
    ) {
        let mut registry = self.channels.lock();
        let entries = registry.entry(name.clone()).or_default();
        let before = entries.len();
        entries.extend(specs);
        trace!(
            channel = %name,
            added = entries.len() - before,
            total = entries.len(),
            "listeners added"
        );
    }

    pub(crate) fn remove_matching<'c>(
        &self,
        name: &Arc<str>,
        callbacks: impl IntoIterator<Item = &'c Callback>,
    ) {
        let mut registry = self.channels.lock();
        // Снятие с несуществующего канала — допустимый no-op.
        let Some(entries) = registry.get_mut(name.as_ref()) else {
            return;
        };
        let before = entries.len();
        for callback in callbacks {
            // Один стабильный проход убирает все вхождения, включая
            // соседние дубликаты.
            entries.retain(|entry| !entry.matches(callback));
        }
        trace!(
            channel = %name,
            removed = before - entries.len(),
            remaining = entries.len(),
            "listeners removed"
        );
    }

    pub(crate) fn dispatch(&self, name: &Arc<str>, args: Vec<Value>) -> Result<(), BroadcastError> {
        self.broadcast_count.fetch_add(1, Ordering::Relaxed);

        // Снимок списка под замком; сами слушатели зовутся уже без
        // него, так что слушатель может обращаться к брокеру повторно.
        let entries = match self.channels.lock().get(name.as_ref()) {
            Some(entries) if !entries.is_empty() => entries.clone(),
            _ => {
                trace!(channel = %name, "broadcast on empty channel");
                return Ok(());
            }
        };

        let message = Message {
            channel: name.clone(),
            args: args.into(),
        };
        debug!(
            channel = %name,
            listeners = entries.len(),
            args = message.args.len(),
            "broadcast"
        );

        for (index, entry) in entries.iter().enumerate() {
            if let Err(source) = entry.invoke(&message) {
                self.failed_count.fetch_add(1, Ordering::Relaxed);
                return Err(BroadcastError::Listener {
                    channel: name.to_string(),
                    index,
                    source,
                });
            }
            self.delivered_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("channels", &self.channels.lock().len())
            .field(
                "broadcast_count",
                &self.broadcast_count.load(Ordering::Relaxed),
            )
            .field(
                "delivered_count",
                &self.delivered_count.load(Ordering::Relaxed),
            )
            .field("failed_count", &self.failed_count.load(Ordering::Relaxed))
            .finish()
    }
}

/// Процессный брокер по умолчанию: общая точка входа для кода, которому
/// достаточно одного реестра на процесс.
static DEFAULT_BROKER: Lazy<Broker> = Lazy::new(Broker::new);

/// Хендл канала на процессном брокере по умолчанию.
pub fn channel(name: impl AsRef<str>) -> Channel<'static> {
    DEFAULT_BROKER.channel(name)
}

/// Ссылка на процессный брокер по умолчанию.
pub fn default_broker() -> &'static Broker {
    &DEFAULT_BROKER
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::callback;

    /// Helper: колбэк, дописывающий метку в общий журнал вызовов.
    fn logger(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Callback {
        let log = log.clone();
        let tag = tag.to_string();
        callback(move |_, _| {
            log.lock().push(tag.clone());
            Ok(())
        })
    }

    /// Тест проверяет, что `channel` не создаёт канал: реестр остаётся
    /// пустым до первого `add`.
    #[test]
    fn test_select_does_not_create_channel() {
        let broker = Broker::new();
        let _handle = broker.channel("lazy");
        assert!(broker.all().is_empty());
        assert_eq!(broker.listener_count("lazy"), 0);
    }

    /// Тест проверяет доставку в порядке регистрации.
    #[test]
    fn test_dispatch_in_registration_order() {
        let broker = Broker::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        broker
            .channel("ord")
            .add(logger(&log, "a"))
            .add(logger(&log, "b"))
            .add(logger(&log, "c"))
            .broadcast([1])
            .unwrap();

        assert_eq!(*log.lock(), ["a", "b", "c"]);
    }

    /// Тест проверяет, что вещание в несозданный канал — no-op:
    /// ни ошибки, ни появления канала в реестре.
    #[test]
    fn test_broadcast_unknown_channel_is_noop() {
        let broker = Broker::new();
        broker.channel("nochan").broadcast([1, 2]).unwrap();

        assert!(broker.all().is_empty());
        assert_eq!(broker.broadcast_count.load(Ordering::Relaxed), 1);
        assert_eq!(broker.delivered_count.load(Ordering::Relaxed), 0);
    }

    /// Тест проверяет, что дубликаты не схлопываются: один колбэк,
    /// добавленный дважды, вызывается дважды за вещание.
    #[test]
    fn test_duplicates_invoked_per_occurrence() {
        let broker = Broker::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cb = logger(&log, "dup");

        broker
            .channel("twice")
            .add(cb.clone())
            .add(cb)
            .broadcast(Vec::<Value>::new())
            .unwrap();

        assert_eq!(log.lock().len(), 2);
    }

    /// Тест проверяет, что после снятия всех слушателей канал остаётся
    /// в реестре пустым списком.
    #[test]
    fn test_removed_channel_stays_registered_empty() {
        let broker = Broker::new();
        let cb = logger(&Arc::new(Mutex::new(Vec::new())), "x");

        broker.channel("kin").add(cb.clone()).remove(&cb);

        let all = broker.all();
        assert_eq!(all.get("kin").map(Vec::len), Some(0));
        assert!(broker.active_channels().is_empty());
    }

    /// Тест проверяет `clear`: канал пропадает из реестра, повторный
    /// вызов сообщает об отсутствии.
    #[test]
    fn test_clear_drops_channel() {
        let broker = Broker::new();
        broker
            .channel("gone")
            .add(logger(&Arc::new(Mutex::new(Vec::new())), "x"));

        assert!(broker.clear("gone"));
        assert!(!broker.clear("gone"));
        assert!(broker.all().is_empty());

        // Вещание после удаления не воссоздаёт канал.
        broker.channel("gone").broadcast([1]).unwrap();
        assert!(broker.all().is_empty());
    }

    /// Тест проверяет счётчики доставки при успешном вещании.
    #[test]
    fn test_counters_track_deliveries() {
        let broker = Broker::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        broker
            .channel("cnt")
            .add(logger(&log, "a"))
            .add(logger(&log, "b"))
            .broadcast([1])
            .unwrap();
        broker.channel("cnt").broadcast([2]).unwrap();

        assert_eq!(broker.broadcast_count.load(Ordering::Relaxed), 2);
        assert_eq!(broker.delivered_count.load(Ordering::Relaxed), 4);
        assert_eq!(broker.failed_count.load(Ordering::Relaxed), 0);
    }

    /// Тест проверяет, что ошибка слушателя прерывает вещание: хвост
    /// не вызывается, счётчик отказов растёт.
    #[test]
    fn test_listener_error_aborts_broadcast() {
        let broker = Broker::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = callback(|_, _| Err("boom".into()));

        let err = broker
            .channel("err")
            .add(logger(&log, "before"))
            .add(failing)
            .add(logger(&log, "after"))
            .broadcast([1])
            .unwrap_err();

        assert_eq!(err.channel(), "err");
        assert_eq!(err.index(), 1);
        assert_eq!(*log.lock(), ["before"]);
        assert_eq!(broker.delivered_count.load(Ordering::Relaxed), 1);
        assert_eq!(broker.failed_count.load(Ordering::Relaxed), 1);
    }

    /// Тест проверяет, что слушатель может обращаться к брокеру во
    /// время доставки (подписать нового слушателя), не ловя дедлок;
    /// текущее вещание идёт по снимку и новичка не видит.
    #[test]
    fn test_listener_may_reenter_broker() {
        let broker = Arc::new(Broker::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let reentrant = {
            let broker = broker.clone();
            let log = log.clone();
            callback(move |_, _| {
                broker.channel("reent").add(logger(&log, "late"));
                log.lock().push("first".to_string());
                Ok(())
            })
        };
        broker.channel("reent").add(reentrant);

        broker.channel("reent").broadcast([1]).unwrap();
        assert_eq!(*log.lock(), ["first"]);

        // Следующее вещание уже видит подписанного изнутри слушателя.
        broker.channel("reent").broadcast([2]).unwrap();
        assert_eq!(*log.lock(), ["first", "first", "late"]);
    }

    /// Тест проверяет `active_channels` и `listener_count`.
    #[test]
    fn test_active_channels_and_counts() {
        let broker = Broker::new();
        let a = logger(&Arc::new(Mutex::new(Vec::new())), "a");

        broker.channel("one").add(a.clone());
        broker.channel("two").add(a.clone()).add(a.clone());
        broker.channel("drained").add(a.clone()).remove(&a);

        assert_eq!(broker.listener_count("one"), 1);
        assert_eq!(broker.listener_count("two"), 2);
        assert_eq!(broker.listener_count("drained"), 0);

        let mut active: Vec<_> = broker
            .active_channels()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        active.sort();
        assert_eq!(active, ["one", "two"]);
    }
}
