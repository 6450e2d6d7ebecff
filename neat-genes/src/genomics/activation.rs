use super::ActivationError;

use ahash::RandomState;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The built-in activation functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // x
    Identity,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sinusoidal,
    // tanh(x)
    Tanh,
}

impl ActivationType {
    /// Every built-in activation type.
    pub const ALL: [ActivationType; 6] = [
        ActivationType::Sigmoid,
        ActivationType::Identity,
        ActivationType::ReLU,
        ActivationType::Gaussian,
        ActivationType::Sinusoidal,
        ActivationType::Tanh,
    ];

    /// Returns the name the activation type is registered under.
    pub fn name(self) -> &'static str {
        match self {
            ActivationType::Sigmoid => "sigmoid",
            ActivationType::Identity => "identity",
            ActivationType::ReLU => "relu",
            ActivationType::Gaussian => "gaussian",
            ActivationType::Sinusoidal => "sinusoidal",
            ActivationType::Tanh => "tanh",
        }
    }

    /// Looks up a built-in activation type by name.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::from_name("relu"), Some(ActivationType::ReLU));
    /// assert_eq!(ActivationType::from_name("softmax"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<ActivationType> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Applies the activation function to `x`.
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            ActivationType::Identity => x,
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Gaussian => (-x * x).exp(),
            ActivationType::Sinusoidal => (std::f32::consts::PI * x).sin(),
            ActivationType::Tanh => x.tanh(),
        }
    }
}

/// Signature of an activation transform.
pub type ActivationFn = dyn Fn(f32) -> f32 + Send + Sync;

/// A named activation transform.
///
/// The transform is reference counted: cloning an `Activation`
/// (and therefore copying a node) shares the same function.
/// Two activations compare equal when their names are equal.
///
/// Activations serialize as their name. Only built-in names
/// can be deserialized; custom transforms must be re-attached
/// through an [`ActivationRegistry`].
#[derive(Clone)]
pub struct Activation {
    name: Arc<str>,
    function: Arc<ActivationFn>,
}

impl Activation {
    /// Wraps a custom transform under the given name.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::Activation;
    ///
    /// let step = Activation::new("step", |x| if x > 0.0 { 1.0 } else { 0.0 });
    ///
    /// assert_eq!(step.name(), "step");
    /// assert_eq!(step.apply(0.5), 1.0);
    /// assert_eq!(step.apply(-0.5), 0.0);
    /// ```
    pub fn new(name: impl Into<Arc<str>>, function: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Activation {
        Activation {
            name: name.into(),
            function: Arc::new(function),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, x: f32) -> f32 {
        (self.function)(x)
    }

    /// Returns whether both activations point to
    /// the very same transform.
    pub fn shares_transform(&self, other: &Activation) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.function) as *const (),
            Arc::as_ptr(&other.function) as *const (),
        )
    }
}

impl From<ActivationType> for Activation {
    fn from(activation_type: ActivationType) -> Activation {
        Activation::new(activation_type.name(), move |x| activation_type.apply(x))
    }
}

impl PartialEq for Activation {
    fn eq(&self, other: &Activation) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Activation").field(&&*self.name).finish()
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Activation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for Activation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Activation, D::Error> {
        let name = String::deserialize(deserializer)?;
        ActivationType::from_name(&name)
            .map(Activation::from)
            .ok_or_else(|| de::Error::custom(ActivationError::UnknownActivation(name)))
    }
}

/// A lookup table of activation transforms by name,
/// from which node genes take their activations.
///
/// A new registry contains every [`ActivationType`].
#[derive(Clone, Debug)]
pub struct ActivationRegistry {
    entries: HashMap<String, Activation, RandomState>,
}

impl Default for ActivationRegistry {
    fn default() -> ActivationRegistry {
        let mut registry = ActivationRegistry::empty();
        for activation_type in ActivationType::ALL {
            registry.register(activation_type.into());
        }
        registry
    }
}

impl ActivationRegistry {
    /// Returns a registry holding the built-in activations.
    pub fn new() -> ActivationRegistry {
        ActivationRegistry::default()
    }

    /// Returns a registry with no activations.
    pub fn empty() -> ActivationRegistry {
        ActivationRegistry {
            entries: HashMap::default(),
        }
    }

    /// Registers an activation under its name, returning
    /// the activation previously registered under it, if any.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{Activation, ActivationRegistry};
    ///
    /// let mut registry = ActivationRegistry::new();
    /// registry.register(Activation::new("square", |x| x * x));
    ///
    /// assert_eq!(registry.get("square").unwrap().apply(3.0), 9.0);
    /// ```
    pub fn register(&mut self, activation: Activation) -> Option<Activation> {
        self.entries.insert(activation.name().to_owned(), activation)
    }

    /// Returns a handle to the activation registered as `name`.
    ///
    /// # Errors
    /// Returns an error if no activation has that name.
    pub fn get(&self, name: &str) -> Result<Activation, ActivationError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ActivationError::UnknownActivation(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns an iterator over the registered names.
    /// No ordering is guaranteed.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
