//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Синхронный pub/sub по именованным каналам: вызывающий выбирает канал,
//! регистрирует слушателей и вещает кортеж аргументов всем слушателям
//! в порядке регистрации.
//!
//! - `broker`: реестр каналов, счётчики и синхронная доставка.
//! - `handle`: хендл выбранного канала, цепочки add/remove/broadcast.
//! - `intern` (приватный): пул interned-имён каналов.
//! - `listener`: нормализованные записи подписки и типы колбэков.
//! - `message`: кортеж аргументов вещания и динамические значения.
//!
//! Публичный API переэкспортирует:
//! - `broker::*`
//! - `handle::*`
//! - `listener::*`
//! - `message::*`

pub mod broker;
pub mod handle;
mod intern;
pub mod listener;
pub mod message;

pub use broker::*;
pub use handle::*;
pub(crate) use intern::intern_name;
pub use listener::*;
pub use message::*;
