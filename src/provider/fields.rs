//! Field wiring handle.

use crate::error::DiResult;
use crate::key::TypeInfo;
use crate::provider::ResolverContext;
use crate::traits::{Dependency, Wired};

/// Assigns resolved dependencies to the fields of one instance.
///
/// Handed to [`Injectable::inject`](crate::Injectable::inject). Every
/// dependency resolved through it names the owning type as its requester,
/// so a missing dependency reports which component needed it.
pub struct Fields<'r, 'a> {
    ctx: &'r mut ResolverContext<'a>,
    owner: TypeInfo,
}

impl<'r, 'a> Fields<'r, 'a> {
    pub(crate) fn new(ctx: &'r mut ResolverContext<'a>, owner: TypeInfo) -> Self {
        Self { ctx, owner }
    }

    /// Type whose fields are being wired.
    pub fn owner(&self) -> TypeInfo {
        self.owner
    }

    /// Resolves `D` and stores it in `slot`.
    ///
    /// Fails when `D` cannot be resolved; declare the field as
    /// `Wired<Option<D>>` to tolerate a missing dependency instead.
    pub fn wire<D: Dependency>(&mut self, name: &'static str, slot: &mut Wired<D>) -> DiResult<()> {
        tracing::trace!(owner = %self.owner, field = name, dependency = %D::key(), "wiring field");
        let dependency = D::resolve(&mut *self.ctx, self.owner)?;
        slot.set(dependency);
        Ok(())
    }

    /// Resolves `D` without a slot, for hand-written wiring.
    pub fn resolve<D: Dependency>(&mut self) -> DiResult<D> {
        D::resolve(&mut *self.ctx, self.owner)
    }
}
