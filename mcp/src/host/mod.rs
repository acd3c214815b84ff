//! Host integration: the handle table the engine reads through, and the thread that owns it

mod dispatcher;
mod pending;

pub use dispatcher::HostThread;
pub use pending::CompletionNotice;
pub use pending::CompletionSignal;
pub use pending::OperationTicket;
pub use pending::PendingOperations;

use crate::error::Error;
use crate::reflect::Handle;
use crate::reflect::Reflect;
use crate::reflect::TypeName;

/// The embedding application's object table
///
/// The engine never owns host objects. It borrows them through `resolve`, mutates private copies,
/// and hands the copies back through `apply`.
pub trait Host {
    /// Live object behind a handle
    fn resolve(&self, handle: Handle) -> Option<&dyn Reflect>;

    /// Commit a mutated copy of the object behind `handle`
    fn apply(&mut self, handle: Handle, object: Box<dyn Reflect>) -> Result<(), Error>;

    /// Components attached to a container entity, in attachment order
    fn attached(&self, _handle: Handle) -> Vec<Handle> { Vec::new() }

    /// Detach `child` from `parent`
    fn detach(&mut self, parent: Handle, child: Handle) -> Result<(), Error> {
        Err(Error::failed_to(
            "detach",
            format!("host does not support detaching {child} from {parent}"),
        ))
    }

    /// Allocate a new host-owned instance of `type_name`
    fn create(&mut self, type_name: &TypeName) -> Result<Handle, Error> {
        Err(Error::failed_to(
            "create",
            format!("host cannot create instances of '{type_name}'"),
        ))
    }

    /// Check out a private copy of the object behind `handle`
    fn checkout(&self, handle: Handle) -> Result<Box<dyn Reflect>, Error> {
        self.resolve(handle)
            .map(Reflect::clone_reflect)
            .ok_or(Error::ReferenceNotFound(handle.id()))
    }

    /// Keep the signal of a started two-phase operation and fire it once the work is done
    ///
    /// Hosts without deferred work complete it immediately.
    fn hold(&mut self, signal: CompletionSignal) { signal.complete("Completed."); }

    /// Advance host-side work; called on the host thread after every dispatched job
    fn update(&mut self) {}
}

/// Host with no objects, used for work that must not touch live host state
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl Host for DetachedHost {
    fn resolve(&self, _handle: Handle) -> Option<&dyn Reflect> { None }

    fn apply(&mut self, handle: Handle, _object: Box<dyn Reflect>) -> Result<(), Error> {
        Err(Error::ReferenceNotFound(handle.id()))
    }
}
