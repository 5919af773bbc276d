use crate::{
    compiler::encode_binary_schema,
    diagnostics::Diagnostics,
    error::KiwiError,
};

use super::{CodeGenerator, GeneratorContext};

/// Writes the binary schema, the same bytes the bridge hands to its host.
pub struct BinaryGenerator;

impl CodeGenerator for BinaryGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, _diagnostics: &mut Diagnostics) -> Result<Vec<u8>, KiwiError> {
        encode_binary_schema(ctx.schema)
    }
}
