use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Пул interned-имён каналов: одинаковые имена разделяют один `Arc<str>`.
/// Crate-private: наружу имена уходят уже interned.
static NAME_POOL: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Возвращает interned `Arc<str>` для имени канала; новое имя
/// попадает в пул при первом обращении.
#[inline]
pub(crate) fn intern_name<S: AsRef<str>>(name: S) -> Arc<str> {
    let key = name.as_ref();
    if let Some(hit) = NAME_POOL.get(key) {
        return hit.clone();
    }
    // Гонка двух первых обращений разрешается через entry: оба потока
    // получат один и тот же Arc.
    NAME_POOL
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}
