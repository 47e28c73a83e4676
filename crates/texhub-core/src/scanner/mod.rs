/// Scanners: turn asset sources into catalog candidates.
///
/// Two source kinds:
/// - **Folders** ([`folder`]): every image under a category's folder is a
///   candidate of that category.
/// - **Materials** ([`property`]): a [`MaterialScanner`] per category
///   inspects a material's property bag for qualifying texture slots.
///
/// Scanners have no ordering relative to each other. The catalog merge is
/// keyed by (identity, category), so running them in any order converges to
/// the same state.
pub mod folder;
pub mod material;
pub mod property;

pub use folder::{category_folder, scan_folder};
pub use material::{Material, TextureSlot};
pub use property::RuleScanner;

use crate::host::AssetHost;
use crate::model::{AssetId, Candidate, Category};
use tracing::debug;

/// The capability "produce candidates from a material".
pub trait MaterialScanner: Send + Sync {
    /// The category every candidate of this scanner is tagged with.
    fn category(&self) -> Category;

    /// Identities of the textures in `material` that qualify for this
    /// category.
    fn qualifying_textures<'m>(&self, material: &'m Material) -> Vec<&'m AssetId>;

    /// Qualifying textures resolved to locations. References the host cannot
    /// resolve are dropped.
    fn scan(&self, material: &Material, host: &dyn AssetHost) -> Vec<Candidate> {
        self.qualifying_textures(material)
            .into_iter()
            .filter_map(|identity| match host.resolve(identity) {
                Some(location) => Some(Candidate::new(
                    identity.clone(),
                    location,
                    self.category(),
                )),
                None => {
                    debug!(
                        "Material '{}' references unknown texture {identity}",
                        material.name
                    );
                    None
                }
            })
            .collect()
    }
}

/// The built-in scanner set: one rule table per category.
pub fn default_scanners() -> Vec<Box<dyn MaterialScanner>> {
    property::ALL
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn MaterialScanner>)
        .collect()
}

/// Run every scanner in `scanners` against `material`.
pub fn scan_material(
    scanners: &[Box<dyn MaterialScanner>],
    material: &Material,
    host: &dyn AssetHost,
) -> Vec<Candidate> {
    scanners
        .iter()
        .flat_map(|scanner| scanner.scan(material, host))
        .collect()
}
