//! The mesh registry: every decodable object in the ROMs, indexed by
//! address.

use hashbrown::HashMap;

use crate::memory::{Memory, ROM_BASE};
use crate::mesh::Mesh;

/// All meshes that decode successfully, built by one eager sweep of
/// the ROM-backed address range.
///
/// The sweep trades startup latency for lock-free reads: a built
/// registry is immutable and can be shared read-only across threads.
/// It is an owned value — construct one and pass it to consumers.
pub struct MeshRegistry {
    meshes: Vec<Mesh>,
    by_address: HashMap<u16, usize>,
}

impl MeshRegistry {
    /// Attempt a mesh decode at every address in [0x2000, 0x8000) and
    /// keep the successes.
    ///
    /// Per-address failures are routine — most of the address space is
    /// vertex data, index lists or code, not object headers — so they
    /// are logged at trace level and skipped, never propagated.
    pub fn build(memory: &Memory) -> Self {
        let mut meshes = Vec::new();
        let mut by_address = HashMap::new();

        for address in ROM_BASE..0x8000 {
            match Mesh::decode(memory, address) {
                Ok(mesh) => {
                    by_address.insert(address, meshes.len());
                    meshes.push(mesh);
                }
                Err(err) => {
                    tracing::trace!(address = format_args!("{address:#06x}"), %err, "no mesh");
                }
            }
        }

        tracing::debug!(count = meshes.len(), "mesh registry sweep complete");
        Self { meshes, by_address }
    }

    /// Look up the mesh decoded at `address`, if any.
    pub fn get(&self, address: u16) -> Option<&Mesh> {
        self.by_address.get(&address).map(|&i| &self.meshes[i])
    }

    /// All meshes in ascending address order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mesh> {
        self.meshes.iter()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl<'a> IntoIterator for &'a MeshRegistry {
    type Item = &'a Mesh;
    type IntoIter = std::slice::Iter<'a, Mesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
