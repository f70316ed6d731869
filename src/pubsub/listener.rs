use std::{any::Any, fmt, sync::Arc};

use super::Message;
use crate::error::ListenerResult;

/// Контекст выполнения слушателя.
///
/// Значение, привязанное к слушателю при регистрации и передаваемое
/// ему при каждом вызове. Тип стирается: слушатель восстанавливает
/// его через `downcast_ref`.
pub type Context = Arc<dyn Any + Send + Sync>;

/// Колбэк слушателя.
///
/// Сравнение при `remove` идёт по идентичности указателя `Arc`,
/// поэтому для последующего снятия подписки вызывающий должен
/// сохранить свой клон колбэка.
pub type Callback = Arc<dyn Fn(&Message, Option<&Context>) -> ListenerResult + Send + Sync>;

/// Оборачивает замыкание в [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&Message, Option<&Context>) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Нормализованная запись подписки.
///
/// Форма фиксируется в момент `add`, а не выясняется заново при каждой
/// доставке: либо голый колбэк, либо пара (колбэк, контекст).
#[derive(Clone)]
pub enum Listener {
    /// Голый колбэк. Внешний контекст не передаётся: окружением вызова
    /// служат собственные захваты замыкания.
    Simple(Callback),
    /// Пара (колбэк, контекст); контекст передаётся при каждом вызове.
    WithContext(Callback, Context),
}

impl Listener {
    pub fn simple(callback: Callback) -> Self {
        Listener::Simple(callback)
    }

    pub fn with_context(callback: Callback, context: Context) -> Self {
        Listener::WithContext(callback, context)
    }

    /// Колбэк записи.
    pub fn callback(&self) -> &Callback {
        match self {
            Listener::Simple(callback) => callback,
            Listener::WithContext(callback, _) => callback,
        }
    }

    /// Привязанный контекст, если запись регистрировалась с ним.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Listener::Simple(_) => None,
            Listener::WithContext(_, context) => Some(context),
        }
    }

    /// Совпадение для снятия подписки: идентичность указателя колбэка,
    /// контекст не сравнивается.
    pub fn matches(&self, callback: &Callback) -> bool {
        Arc::ptr_eq(self.callback(), callback)
    }

    pub(crate) fn invoke(&self, message: &Message) -> ListenerResult {
        match self {
            Listener::Simple(callback) => callback(message, None),
            Listener::WithContext(callback, context) => callback(message, Some(context)),
        }
    }
}

impl From<Callback> for Listener {
    fn from(callback: Callback) -> Self {
        Listener::Simple(callback)
    }
}

impl From<(Callback, Context)> for Listener {
    fn from((callback, context): (Callback, Context)) -> Self {
        Listener::WithContext(callback, context)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ptr = Arc::as_ptr(self.callback()).cast::<()>();
        match self {
            Listener::Simple(_) => f.debug_tuple("Simple").field(&ptr).finish(),
            Listener::WithContext(..) => f.debug_tuple("WithContext").field(&ptr).finish(),
        }
    }
}
