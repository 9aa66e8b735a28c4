use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 服务键：类型ID + 类型名（仅用于日志和错误信息）
///
/// 支持非定长类型，例如 `dyn Trait`。相等性只比较 `TypeId`。
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}
    struct English;

    #[test]
    fn test_key_equality() {
        assert_eq!(ServiceKey::of::<English>(), ServiceKey::of::<English>());
        assert_ne!(ServiceKey::of::<English>(), ServiceKey::of::<dyn Greeter>());
    }

    #[test]
    fn test_key_display_uses_type_name() {
        let key = ServiceKey::of::<dyn Greeter>();
        assert!(key.to_string().contains("Greeter"));
        assert!(format!("{:?}", key).starts_with("ServiceKey("));
    }
}
