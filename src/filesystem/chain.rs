/// Bounded walking of on-disk linked sector chains
///
/// Both the catalog and each file's track/sector list are singly linked lists
/// of sectors, each sector carrying the (track, sector) of the next one at a
/// fixed offset. [`ChainWalker`] follows such a chain over the image buffer,
/// yielding every node in link order.
///
/// A chain is capped at one hop per sector on the disk. Anything longer must
/// revisit a sector, so it is reported as a malformed image instead of looping.

use crate::error::{DosError, Result};
use crate::format::*;
use crate::image::DiskImage;
use log::trace;
use std::marker::PhantomData;

/// Where a node stores its link and how the end of the chain is encoded
pub trait ChainLayout {
    /// Name used in error messages
    const NAME: &'static str;
    /// Offset of the next-track byte
    const NEXT_TRACK: usize;
    /// Offset of the next-sector byte
    const NEXT_SECTOR: usize;

    /// Whether a link value terminates the chain
    fn is_end(link: TrackSector) -> bool;

    /// Decode the link of a node, `None` at the end of the chain
    fn next(data: &[u8]) -> Option<TrackSector> {
        let link = TrackSector::new(data[Self::NEXT_TRACK], data[Self::NEXT_SECTOR]);
        if Self::is_end(link) {
            None
        } else {
            Some(link)
        }
    }
}

/// Catalog sectors end when the next track is 0
pub struct CatalogLayout;

impl ChainLayout for CatalogLayout {
    const NAME: &'static str = "catalog";
    const NEXT_TRACK: usize = CATALOG_NEXT_TRACK;
    const NEXT_SECTOR: usize = CATALOG_NEXT_SECTOR;

    fn is_end(link: TrackSector) -> bool {
        link.track == 0
    }
}

/// Track/sector list sectors end at a (0,0) link
pub struct TsListLayout;

impl ChainLayout for TsListLayout {
    const NAME: &'static str = "track/sector list";
    const NEXT_TRACK: usize = TSLIST_NEXT_TRACK;
    const NEXT_SECTOR: usize = TSLIST_NEXT_SECTOR;

    fn is_end(link: TrackSector) -> bool {
        link.is_zero()
    }
}

/// Iterator over the nodes of a chain
pub struct ChainWalker<'a, L: ChainLayout> {
    image: &'a DiskImage,
    next: Option<TrackSector>,
    hops: usize,
    limit: usize,
    _layout: PhantomData<L>,
}

impl<'a, L: ChainLayout> ChainWalker<'a, L> {
    /// Start walking at `head`
    pub fn new(image: &'a DiskImage, head: TrackSector) -> Self {
        Self {
            image,
            next: Some(head),
            hops: 0,
            limit: image.geometry().total_sectors(),
            _layout: PhantomData,
        }
    }
}

impl<'a, L: ChainLayout> Iterator for ChainWalker<'a, L> {
    type Item = Result<(TrackSector, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        let ts = self.next.take()?;

        if self.hops >= self.limit {
            return Some(Err(DosError::malformed(format!(
                "{} chain is longer than {} sectors",
                L::NAME,
                self.limit
            ))));
        }
        self.hops += 1;

        let data = match self.image.read_sector(ts) {
            Ok(data) => data,
            Err(_) => {
                return Some(Err(DosError::malformed(format!(
                    "{} chain points outside the disk at {}",
                    L::NAME,
                    ts
                ))))
            }
        };

        self.next = L::next(data);
        trace!("{} node {} -> {:?}", L::NAME, ts, self.next);
        Some(Ok((ts, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(image: &mut DiskImage, from: TrackSector, to: TrackSector) {
        let sector = image.sector_mut(from).unwrap();
        sector[1] = to.track;
        sector[2] = to.sector;
    }

    #[test]
    fn test_walk_catalog_chain() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        link(&mut image, TrackSector::new(17, 15), TrackSector::new(17, 14));
        link(&mut image, TrackSector::new(17, 14), TrackSector::new(17, 13));

        let nodes: Vec<TrackSector> = ChainWalker::<CatalogLayout>::new(&image, TrackSector::new(17, 15))
            .map(|node| node.unwrap().0)
            .collect();

        assert_eq!(
            nodes,
            vec![
                TrackSector::new(17, 15),
                TrackSector::new(17, 14),
                TrackSector::new(17, 13)
            ]
        );
    }

    #[test]
    fn test_catalog_ends_on_track_zero() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        link(&mut image, TrackSector::new(17, 15), TrackSector::new(0, 5));

        let count = ChainWalker::<CatalogLayout>::new(&image, TrackSector::new(17, 15)).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_tslist_follows_track_zero_sector() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        link(&mut image, TrackSector::new(20, 0), TrackSector::new(0, 5));

        let count = ChainWalker::<TsListLayout>::new(&image, TrackSector::new(20, 0)).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_cycle_is_malformed() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        link(&mut image, TrackSector::new(17, 15), TrackSector::new(17, 14));
        link(&mut image, TrackSector::new(17, 14), TrackSector::new(17, 15));

        let result: Result<Vec<_>> =
            ChainWalker::<CatalogLayout>::new(&image, TrackSector::new(17, 15)).collect();
        assert!(matches!(result, Err(DosError::MalformedImage(_))));
    }

    #[test]
    fn test_link_outside_disk_is_malformed() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        link(&mut image, TrackSector::new(17, 15), TrackSector::new(60, 2));

        let mut walker = ChainWalker::<CatalogLayout>::new(&image, TrackSector::new(17, 15));
        assert!(walker.next().unwrap().is_ok());
        assert!(matches!(walker.next(), Some(Err(DosError::MalformedImage(_)))));
        assert!(walker.next().is_none());
    }
}
