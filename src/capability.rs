//! Host capabilities and the query surface plugins consume.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// A feature a host may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ImagesHasComments,
    ImagesHasTime,
    HostSupportsDateRanges,
    HostAcceptNewImages,
    ImagesHasTitlesWritable,
    HostSupportsTags,
    HostSupportsRating,
    HostSupportsThumbnails,
    HostSupportsReadWriteLock,
    HostSupportsPickLabel,
    HostSupportsColorLabel,
    HostSupportsItemReservation,
    HostSupportsPreviews,
    HostSupportsRawProcessing,
    HostSupportsMetadataProcessing,
    HostSupportsSaveImages,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Capability; 16] = [
        Capability::ImagesHasComments,
        Capability::ImagesHasTime,
        Capability::HostSupportsDateRanges,
        Capability::HostAcceptNewImages,
        Capability::ImagesHasTitlesWritable,
        Capability::HostSupportsTags,
        Capability::HostSupportsRating,
        Capability::HostSupportsThumbnails,
        Capability::HostSupportsReadWriteLock,
        Capability::HostSupportsPickLabel,
        Capability::HostSupportsColorLabel,
        Capability::HostSupportsItemReservation,
        Capability::HostSupportsPreviews,
        Capability::HostSupportsRawProcessing,
        Capability::HostSupportsMetadataProcessing,
        Capability::HostSupportsSaveImages,
    ];

    /// Bit of this capability in a [`Capabilities`] set.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Name used in descriptors.
    pub fn name(self) -> &'static str {
        match self {
            Capability::ImagesHasComments => "ImagesHasComments",
            Capability::ImagesHasTime => "ImagesHasTime",
            Capability::HostSupportsDateRanges => "HostSupportsDateRanges",
            Capability::HostAcceptNewImages => "HostAcceptNewImages",
            Capability::ImagesHasTitlesWritable => "ImagesHasTitlesWritable",
            Capability::HostSupportsTags => "HostSupportsTags",
            Capability::HostSupportsRating => "HostSupportsRating",
            Capability::HostSupportsThumbnails => "HostSupportsThumbnails",
            Capability::HostSupportsReadWriteLock => "HostSupportsReadWriteLock",
            Capability::HostSupportsPickLabel => "HostSupportsPickLabel",
            Capability::HostSupportsColorLabel => "HostSupportsColorLabel",
            Capability::HostSupportsItemReservation => "HostSupportsItemReservation",
            Capability::HostSupportsPreviews => "HostSupportsPreviews",
            Capability::HostSupportsRawProcessing => "HostSupportsRawProcessing",
            Capability::HostSupportsMetadataProcessing => "HostSupportsMetadataProcessing",
            Capability::HostSupportsSaveImages => "HostSupportsSaveImages",
        }
    }

    /// Look up a capability by descriptor name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown capability: {}", s))
    }
}

/// A set of capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u32);

impl Capabilities {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Capabilities::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

#[derive(Debug)]
struct CollectionData {
    name: String,
    comment: String,
    path: Option<PathBuf>,
    images: Vec<PathBuf>,
}

/// Shared handle to an album or selection exposed by the host.
///
/// Cloning shares the underlying data; it is released with the last handle.
#[derive(Debug, Clone)]
pub struct ImageCollection {
    inner: Arc<CollectionData>,
}

impl ImageCollection {
    pub fn new(name: impl Into<String>, images: Vec<PathBuf>) -> Self {
        Self {
            inner: Arc::new(CollectionData {
                name: name.into(),
                comment: String::new(),
                path: None,
                images,
            }),
        }
    }

    /// Build a collection that also has a comment and a backing path.
    pub fn with_details(
        name: impl Into<String>,
        comment: impl Into<String>,
        path: Option<PathBuf>,
        images: Vec<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(CollectionData {
                name: name.into(),
                comment: comment.into(),
                path,
                images,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn comment(&self) -> &str {
        &self.inner.comment
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.inner.images
    }

    /// Whether both handles refer to the same collection.
    pub fn same_as(&self, other: &ImageCollection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Query surface of the host application.
pub trait HostInterface {
    /// Capabilities the host supports.
    fn features(&self) -> Capabilities;

    /// Check a capability by descriptor name. Unknown names are unsupported.
    fn has_feature(&self, name: &str) -> bool {
        match Capability::from_name(name) {
            Some(capability) => self.features().contains(capability),
            None => {
                tracing::warn!("Unknown host capability queried: {}", name);
                false
            }
        }
    }

    /// Album currently shown by the host.
    fn current_album(&self) -> Option<ImageCollection> {
        None
    }

    /// Images currently selected in the host.
    fn current_selection(&self) -> Option<ImageCollection> {
        None
    }

    /// All albums known to the host.
    fn all_albums(&self) -> Vec<ImageCollection> {
        Vec::new()
    }

    /// Notify the host that images were changed by a plugin.
    fn refresh_images(&self, _images: &[PathBuf]) {}
}
