use std::{collections::HashMap, sync::Arc};

use super::{Broker, Callback, Listener, Value};
use crate::error::BroadcastError;

/// Хендл выбранного канала.
///
/// Возвращается из [`Broker::channel`]; операции действуют на связанный
/// канал и возвращают хендл обратно, позволяя строить цепочки:
///
/// ```
/// use rupor::{callback, Broker};
///
/// let broker = Broker::new();
/// let on_news = callback(|msg, _| {
///     println!("news: {:?}", msg.args);
///     Ok(())
/// });
/// broker
///     .channel("news")
///     .add(on_news)
///     .broadcast([1, 2, 3])?;
/// # Ok::<(), rupor::BroadcastError>(())
/// ```
///
/// Имя канала живёт в самом хендле, а не в брокере: чередующиеся
/// цепочки на разных каналах не влияют друг на друга.
#[derive(Debug, Clone)]
pub struct Channel<'a> {
    broker: &'a Broker,
    name: Arc<str>,
}

impl<'a> Channel<'a> {
    pub(crate) fn new(broker: &'a Broker, name: Arc<str>) -> Self {
        Self { broker, name }
    }

    /// Имя выбранного канала.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Регистрирует слушателя, создавая канал при первом добавлении.
    ///
    /// Принимает голый [`Callback`] (станет `Listener::Simple`) или пару
    /// `(Callback, Context)` (станет `Listener::WithContext`). Дубликаты
    /// не схлопываются: каждое вхождение вызывается отдельно.
    pub fn add(self, spec: impl Into<Listener>) -> Self {
        self.broker.add_entries(&self.name, [spec.into()]);
        self
    }

    /// Регистрирует несколько слушателей, сохраняя порядок перечисления.
    pub fn add_all<I>(self, specs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Listener>,
    {
        self.broker
            .add_entries(&self.name, specs.into_iter().map(Into::into));
        self
    }

    /// Снимает с канала все вхождения колбэка.
    ///
    /// Совпадение — идентичность указателя `Arc`. Колбэк, которого на
    /// канале нет, молча игнорируется.
    pub fn remove(self, callback: &Callback) -> Self {
        self.broker.remove_matching(&self.name, [callback]);
        self
    }

    /// Снимает несколько колбэков за один вызов.
    pub fn remove_all<'c, I>(self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = &'c Callback>,
    {
        self.broker.remove_matching(&self.name, callbacks);
        self
    }

    /// Вещает кортеж аргументов всем слушателям канала в порядке
    /// регистрации.
    ///
    /// Каждый слушатель получает один и тот же полный кортеж. Вещание в
    /// канал, который ещё не создавался, — допустимый no-op. Ошибка
    /// слушателя прерывает доставку и возвращается вызывающему.
    pub fn broadcast<I>(self, args: I) -> Result<Self, BroadcastError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        self.broker.dispatch(&self.name, args)?;
        Ok(self)
    }

    /// Снимок всего реестра брокера, см. [`Broker::all`].
    pub fn all(&self) -> HashMap<Arc<str>, Vec<Listener>> {
        self.broker.all()
    }

    /// Количество слушателей на выбранном канале.
    pub fn listener_count(&self) -> usize {
        self.broker.listener_count(self.name.as_ref())
    }
}
