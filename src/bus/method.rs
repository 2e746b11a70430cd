//! # Method invocation with best-effort argument coercion.
//!
//! Remote methods declare their argument shapes in introspection data, but
//! callers often hold looser types (an `i64` where the wire wants `u`, a
//! heterogeneous list where the wire wants `as`). [`Method::call`]
//! introspects the target object before sending, finds the method by
//! name-suffix and coerces every "in" argument to its declared shape.
//!
//! Coercion is deliberately best-effort: a failed conversion substitutes the
//! signature's default value and is collected into a joined warning, so a
//! partially-introspectable method is still called with the best values
//! available. Only transport failures abort the call.

use tracing::trace;

use crate::bus::connection::Bus;
use crate::bus::value::BusValue;
use crate::error::BusError;

/// A callable method on a given object path and interface.
#[derive(Clone, Debug)]
pub struct Method {
    bus: Bus,
    path: String,
    interface: String,
    name: String,
}

impl Method {
    /// Creates a method handle.
    pub fn new(
        bus: Bus,
        path: impl Into<String>,
        interface: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            path: path.into(),
            interface: interface.into(),
            name: name.into(),
        }
    }

    /// Invokes the method with the given arguments.
    ///
    /// Arguments are sanitized against the object's introspection data
    /// first; sanitization warnings are logged, never returned as errors.
    pub async fn call(&self, args: Vec<BusValue>) -> Result<(), BusError> {
        let conn = self.bus.connection()?;

        let clean_args = if args.is_empty() {
            args
        } else {
            let (clean, warnings) = self.sanitize_args(args).await;
            if !warnings.is_empty() {
                trace!(
                    bus = %self.bus.kind(),
                    method = %self.name,
                    warnings = %warnings.join("; "),
                    "sanitized method arguments with warnings",
                );
            }
            clean
        };

        conn.call(&self.path, &self.interface, &self.name, clean_args)
            .await?;

        Ok(())
    }

    /// Coerces caller arguments to the shapes declared in introspection.
    ///
    /// Returns the cleaned arguments plus any warnings. If the object cannot
    /// be introspected at all, the original arguments are returned unchanged
    /// with a single warning.
    async fn sanitize_args(&self, args: Vec<BusValue>) -> (Vec<BusValue>, Vec<String>) {
        let conn = match self.bus.connection() {
            Ok(conn) => conn,
            Err(err) => return (args, vec![err.to_string()]),
        };

        let introspection = match conn.introspect(&self.path, &self.interface).await {
            Ok(doc) => doc,
            Err(err) => {
                return (args, vec![format!("could not introspect: {err}")]);
            }
        };

        let method = match introspection.find_method(&self.name) {
            Ok(method) => method,
            Err(err) => {
                return (args, vec![format!("could not retrieve method details: {err}")]);
            }
        };

        let mut warnings = Vec::new();
        let mut clean = Vec::with_capacity(args.len());
        let mut signatures = method.input_args().map(|arg| arg.signature.clone());

        for (idx, arg) in args.into_iter().enumerate() {
            match signatures.next() {
                Some(signature) => match arg.coerce(&signature) {
                    Ok(value) => clean.push(value),
                    Err(err) => {
                        warnings.push(format!(
                            "could not convert argument {idx}, using default value: {err}"
                        ));
                        clean.push(BusValue::signature_default(&signature));
                    }
                },
                // More caller arguments than declared: pass through as-is.
                None => clean.push(arg),
            }
        }

        (clean, warnings)
    }
}
