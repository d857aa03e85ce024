//! Named, fixed-arity uniform vectors attached to a profile.

use glam::{Vec2, Vec3, Vec4};

use crate::curve::{Component, UniformLookup};

/// One uniform vector; the variant fixes its arity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    pub fn arity(&self) -> usize {
        match self {
            Self::Vec2(_) => 2,
            Self::Vec3(_) => 3,
            Self::Vec4(_) => 4,
        }
    }

    pub fn component(&self, component: Component) -> Option<f32> {
        let i = component.index();
        if i >= self.arity() {
            return None;
        }
        Some(self.to_padded()[i])
    }

    /// Components followed by zeros up to four lanes (one 16-byte uniform slot)
    pub fn to_padded(&self) -> [f32; 4] {
        match self {
            Self::Vec2(v) => [v.x, v.y, 0.0, 0.0],
            Self::Vec3(v) => [v.x, v.y, v.z, 0.0],
            Self::Vec4(v) => v.to_array(),
        }
    }

    pub fn wgsl_type(&self) -> &'static str {
        match self {
            Self::Vec2(_) => "vec2<f32>",
            Self::Vec3(_) => "vec3<f32>",
            Self::Vec4(_) => "vec4<f32>",
        }
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

/// Ordered uniform declarations; position in the set is the binding slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a uniform; returns false if the name is already declared
    pub(crate) fn push(&mut self, name: &'static str, value: UniformValue) -> bool {
        if self.get(name).is_some() {
            return false;
        }
        self.entries.push((name, value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Binding slot of a uniform
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| *n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> + '_ {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UniformLookup for UniformSet {
    fn component(&self, name: &str, component: Component) -> Option<f32> {
        self.get(name).and_then(|v| v.component(component))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_respects_arity() {
        let v = UniformValue::from(Vec2::new(5.0, 2.0));
        assert_eq!(v.component(Component::X), Some(5.0));
        assert_eq!(v.component(Component::Y), Some(2.0));
        assert_eq!(v.component(Component::Z), None);
        assert_eq!(v.to_padded(), [5.0, 2.0, 0.0, 0.0]);
        assert_eq!(v.wgsl_type(), "vec2<f32>");
    }

    #[test]
    fn test_set_keeps_declaration_order() {
        let mut set = UniformSet::new();
        assert!(set.push("uFreq", Vec4::new(4.0, 8.0, 8.0, 1.0).into()));
        assert!(set.push("uAmp", Vec4::new(25.0, 5.0, 10.0, 10.0).into()));
        assert!(!set.push("uFreq", Vec2::ZERO.into()));

        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["uFreq", "uAmp"]);
        assert_eq!(set.slot("uAmp"), Some(1));
        assert_eq!(set.component("uAmp", Component::W), Some(10.0));
        assert_eq!(set.component("uPowY", Component::X), None);
    }
}
