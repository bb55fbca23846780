use std::ops::Deref;

use super::Object;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Object>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, obj: Object) {
        self.0.push(obj);
    }
}

impl From<Vec<Object>> for Array {
    fn from(v: Vec<Object>) -> Self {
        Array(v)
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl Deref for Array {
    type Target = Vec<Object>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            item.fmt(f)?;
        }
        write!(f, "]")
    }
}
