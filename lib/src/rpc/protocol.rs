//! Dispatch table built for a single protocol.
//!
//! A [`Protocol`] maps method names to a [`MethodDescription`]: a factory
//! allocating a fresh typed argument holder, and a handler receiving the
//! decoded holder. Every method takes exactly one argument envelope, which
//! travels over the wire as a positional sequence holding that single
//! envelope.

use std::any::{type_name, Any};
use std::future::Future;
use std::sync::Arc;

use fnv::FnvHashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::net::{decode, encode, Encoding};
use crate::rpc::{Context, MethodType};
use crate::{Error, Result};

/// Type-erased argument holder produced by a method's [`MakeArg`] factory.
pub trait Args: Send {
    /// Decodes a wire payload into the holder.
    ///
    /// The payload has to be a sequence of exactly one element matching the
    /// holder's envelope type, anything else is a [`Error::TypeError`].
    fn decode(&mut self, payload: &[u8], encoding: Encoding) -> Result<()>;

    /// Name of the concrete holder type, used in type errors.
    fn holder_name(&self) -> &'static str;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> Args for [T; 1]
where
    T: DeserializeOwned + Send + 'static,
{
    fn decode(&mut self, payload: &[u8], encoding: Encoding) -> Result<()> {
        let mut seq: Vec<T> = decode(payload, encoding)
            .map_err(|e| Error::type_error(type_name::<[T; 1]>(), e.to_string()))?;
        if seq.len() != 1 {
            return Err(Error::type_error(
                type_name::<[T; 1]>(),
                format!("sequence of {} elements", seq.len()),
            ));
        }
        if let Some(envelope) = seq.pop() {
            self[0] = envelope;
        }
        Ok(())
    }

    fn holder_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Type-erased value returned by a handler.
pub trait Reply: Send {
    fn encode(&self, encoding: Encoding) -> Result<Vec<u8>>;
}

impl<T: Serialize + Send> Reply for T {
    fn encode(&self, encoding: Encoding) -> Result<Vec<u8>> {
        encode(self, encoding)
    }
}

pub type MakeArg = fn() -> Box<dyn Args>;

pub type Handler =
    Arc<dyn Fn(Context, Box<dyn Args>) -> BoxFuture<'static, Result<Box<dyn Reply>>> + Send + Sync>;

fn make_arg<T>() -> Box<dyn Args>
where
    T: DeserializeOwned + Default + Send + 'static,
{
    Box::new([T::default()])
}

/// Recovers the typed envelope from an erased holder.
pub fn downcast_args<T: 'static>(args: Box<dyn Args>) -> Result<T> {
    let actual = args.holder_name();
    match args.into_any().downcast::<[T; 1]>() {
        Ok(holder) => {
            let [envelope] = *holder;
            Ok(envelope)
        }
        Err(_) => Err(Error::type_error(type_name::<[T; 1]>(), actual)),
    }
}

#[derive(Clone)]
pub struct MethodDescription {
    pub make_arg: MakeArg,
    pub handler: Handler,
    pub method_type: MethodType,
}

impl MethodDescription {
    /// Describes a request/response method.
    pub fn call<A, R, F, Fut>(f: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        Self::with_type::<A, R, F, Fut>(MethodType::Call, f)
    }

    /// Describes a fire-and-forget method.
    pub fn notify<A, F, Fut>(f: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        F: Fn(Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::with_type::<A, (), F, Fut>(MethodType::Notify, f)
    }

    fn with_type<A, R, F, Fut>(method_type: MethodType, f: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx: Context, args: Box<dyn Args>| {
            match downcast_args::<A>(args) {
                Ok(envelope) => f(ctx, envelope)
                    .map(|res| res.map(|reply| Box::new(reply) as Box<dyn Reply>))
                    .boxed(),
                Err(e) => futures::future::ready(Err(e)).boxed(),
            }
        });
        Self {
            make_arg: make_arg::<A>,
            handler,
            method_type,
        }
    }
}

/// Named dispatch table for one protocol.
///
/// Built once by the generated builder function and never mutated
/// afterwards.
#[derive(Clone)]
pub struct Protocol {
    pub name: String,
    pub methods: FnvHashMap<String, MethodDescription>,
}

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: FnvHashMap::default(),
        }
    }

    pub fn with_method(mut self, name: impl Into<String>, method: MethodDescription) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    /// Fully qualified wire names of all methods, sorted.
    pub fn wire_names(&self) -> Vec<String> {
        let mut names = self
            .methods
            .keys()
            .map(|method| format!("{}.{}", self.name, method))
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}
