use crate::error::Error;
use crate::host::CompletionSignal;
use crate::host::Host;
use crate::host::OperationTicket;
use crate::host::PendingOperations;
use crate::reflect::Reflect;

/// What a method body can reach while it runs
pub struct InvokeContext<'a> {
    host:       &'a mut dyn Host,
    operations: Option<&'a PendingOperations>,
    started:    Option<OperationTicket>,
}

impl<'a> InvokeContext<'a> {
    /// Context over `host`; without `operations` two-phase methods cannot start
    pub fn new(host: &'a mut dyn Host, operations: Option<&'a PendingOperations>) -> Self {
        Self {
            host,
            operations,
            started: None,
        }
    }

    /// Read access to live host objects
    pub fn host(&self) -> &dyn Host { &*self.host }

    /// Write access to live host objects
    pub fn host_mut(&mut self) -> &mut dyn Host { &mut *self.host }

    /// Start a two-phase operation
    ///
    /// The caller gets a processing result right away. The returned signal must reach the host
    /// (usually through [`Host::hold`]), which fires it when the work finishes.
    pub fn begin_operation(
        &mut self,
        description: impl Into<String>,
    ) -> Result<CompletionSignal, Error> {
        let operations = self.operations.ok_or_else(|| {
            Error::HostOperation(
                "two-phase operations need the host thread; call with runOnHostThread".to_string(),
            )
        })?;
        if self.started.is_some() {
            return Err(Error::HostOperation(
                "a method can start only one two-phase operation".to_string(),
            ));
        }
        let (ticket, signal) = operations.start(description);
        self.started = Some(ticket);
        Ok(signal)
    }

    /// Ticket of the operation started during the call, if any
    pub(crate) fn take_ticket(&mut self) -> Option<OperationTicket> { self.started.take() }
}

/// Bound arguments in declaration order; `None` is a null reference
#[derive(Debug, Default)]
pub struct Args {
    values: Vec<Option<Box<dyn Reflect>>>,
}

impl Args {
    pub(crate) const fn new(values: Vec<Option<Box<dyn Reflect>>>) -> Self { Self { values } }

    /// Argument `index` as a `T`; null and mistyped arguments are errors
    pub fn get<T: Reflect>(&self, index: usize) -> Result<&T, Error> {
        self.get_opt(index)?.ok_or_else(|| {
            Error::InvocationFault(format!("argument {index} is null"))
        })
    }

    /// Argument `index` as a `T`, or `None` when it is null
    pub fn get_opt<T: Reflect>(&self, index: usize) -> Result<Option<&T>, Error> {
        let slot = self.values.get(index).ok_or_else(|| {
            Error::ParameterCountMismatch(format!(
                "argument {index} requested, {} bound",
                self.values.len()
            ))
        })?;
        slot.as_deref()
            .map(|value| {
                value.downcast_ref::<T>().ok_or_else(|| {
                    Error::InvocationFault(format!(
                        "argument {index} is a '{}', not the expected type",
                        value.type_name()
                    ))
                })
            })
            .transpose()
    }

    /// Number of bound arguments
    pub fn len(&self) -> usize { self.values.len() }

    /// True when the method takes no arguments
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DetachedHost;

    #[test]
    fn test_args_are_typed() {
        let args = Args::new(vec![Some(Box::new(2.5_f32) as Box<dyn Reflect>), None]);
        assert_eq!(args.get::<f32>(0).ok(), Some(&2.5));
        assert!(matches!(args.get::<i32>(0), Err(Error::InvocationFault(_))));
        assert!(matches!(args.get_opt::<f32>(1), Ok(None)));
        assert!(matches!(args.get::<f32>(2), Err(Error::ParameterCountMismatch(_))));
    }

    #[test]
    fn test_operations_need_a_tracker() {
        let mut host = DetachedHost;
        let mut cx = InvokeContext::new(&mut host, None);
        assert!(matches!(cx.begin_operation("bake"), Err(Error::HostOperation(_))));

        let operations = PendingOperations::new();
        let mut cx = InvokeContext::new(&mut host, Some(&operations));
        assert!(cx.begin_operation("bake").is_ok());
        assert!(cx.begin_operation("bake again").is_err());
        assert!(cx.take_ticket().is_some());
    }
}
