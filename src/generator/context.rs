use crate::block::JavaType;
use ahash::AHashSet;

/// Names and expectations visible to the statement being generated.
///
/// Passed down through every recursive call. Nested bodies receive a clone, so a
/// local declared inside a block stays scoped to that block, like in Java.
#[derive(Debug, Clone, Default)]
pub struct GenContext {
    props: AHashSet<String>,
    params: AHashSet<String>,
    locals: AHashSet<String>,
    return_type: Option<JavaType>,
}

impl GenContext {
    /// An empty context. Background bodies start from this: they cannot see the
    /// enclosing routine's parameters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_props<I, T>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.props.extend(props.into_iter().map(Into::into));
        self
    }

    pub fn with_params<I, T>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    pub fn with_return_type(mut self, return_type: JavaType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Whether `name` already refers to a property, parameter or local in scope.
    pub fn knows(&self, name: &str) -> bool {
        self.props.contains(name) || self.params.contains(name) || self.locals.contains(name)
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.contains(name)
    }

    pub fn declare(&mut self, name: &str) {
        self.locals.insert(name.to_string());
    }

    pub fn return_type(&self) -> Option<&JavaType> {
        self.return_type.as_ref()
    }
}
