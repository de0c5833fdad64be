use std::fmt;
use std::ops::{Index, IndexMut};

use crate::config::ZoneConfig;
use crate::integration::{GeometryOf, Integration, NumericsOf, SolversOf};
use crate::preprocess::PreprocessError;

/// Identity of a zone within a simulation, contiguous in `[0, n_zones)`.
///
/// For spectral problems the index is also the time-instance identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(pub usize);

impl ZoneId {
    /// Returns the raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ZoneId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A sub-domain with its own geometry, solver states, integration scheme,
/// and numerics.
///
/// All parts are exclusively owned, so a zone can only be mutated through
/// whoever holds it. Drivers never reach one zone's state through another.
pub struct Zone<I: Integration> {
    id: ZoneId,
    config: ZoneConfig,
    geometry: I::Geometry,
    solvers: I::Solvers,
    integration: I,
    numerics: I::Numerics,
}

impl<I: Integration> Zone<I> {
    /// Creates a zone from already assembled parts.
    ///
    /// Most callers should go through [`assemble_zone`](crate::assemble_zone)
    /// or [`preprocess`](crate::preprocess) instead.
    pub fn new(
        id: ZoneId,
        config: ZoneConfig,
        geometry: GeometryOf<I>,
        solvers: SolversOf<I>,
        integration: I,
        numerics: NumericsOf<I>,
    ) -> Self {
        Self {
            id,
            config,
            geometry,
            solvers,
            integration,
            numerics,
        }
    }

    #[must_use]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    #[must_use]
    pub fn geometry(&self) -> &I::Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut I::Geometry {
        &mut self.geometry
    }

    #[must_use]
    pub fn solvers(&self) -> &I::Solvers {
        &self.solvers
    }

    pub fn solvers_mut(&mut self) -> &mut I::Solvers {
        &mut self.solvers
    }

    #[must_use]
    pub fn numerics(&self) -> &I::Numerics {
        &self.numerics
    }

    #[must_use]
    pub fn integration(&self) -> &I {
        &self.integration
    }

    pub fn integration_mut(&mut self) -> &mut I {
        &mut self.integration
    }

    /// Runs the integration scheme's per-step preprocessing.
    ///
    /// # Errors
    ///
    /// Propagates the integration scheme's error unchanged.
    pub fn preprocess(&mut self, step: usize) -> Result<(), I::Error> {
        self.integration.preprocess(
            &mut self.geometry,
            &mut self.solvers,
            &self.numerics,
            &self.config,
            step,
        )
    }

    /// Advances the zone by one step and returns its convergence metric.
    ///
    /// # Errors
    ///
    /// Propagates the integration scheme's error unchanged.
    pub fn advance(&mut self, step: usize) -> Result<f64, I::Error> {
        self.integration.advance(
            &mut self.geometry,
            &mut self.solvers,
            &self.numerics,
            &self.config,
            step,
        )
    }

    /// Commits the step.
    ///
    /// # Errors
    ///
    /// Propagates the integration scheme's error unchanged.
    pub fn update(&mut self, step: usize) -> Result<(), I::Error> {
        self.integration.update(
            &mut self.geometry,
            &mut self.solvers,
            &self.numerics,
            &self.config,
            step,
        )
    }
}

impl<I> fmt::Debug for Zone<I>
where
    I: Integration,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The arena of zones in a simulation, indexed by [`ZoneId`].
///
/// Zone ids are guaranteed to be `0..len()` in order.
pub struct ZoneSet<I: Integration> {
    zones: Vec<Zone<I>>,
}

impl<I: Integration> ZoneSet<I> {
    /// Creates a zone set, checking that ids are contiguous and in order.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::ZoneOrder`] if the zone at position `i`
    /// does not carry id `i`.
    pub fn new(zones: Vec<Zone<I>>) -> Result<Self, PreprocessError> {
        let set = Self { zones };
        set.check_order()?;
        Ok(set)
    }

    /// Checks that the zone at position `i` still carries id `i`.
    ///
    /// Whole zones can be swapped through [`iter_mut`](Self::iter_mut), so
    /// drivers that pair positions with ids re-check before each step.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::ZoneOrder`] for the first misplaced zone.
    pub fn check_order(&self) -> Result<(), PreprocessError> {
        match self
            .zones
            .iter()
            .enumerate()
            .find(|(position, zone)| zone.id().index() != *position)
        {
            Some((position, zone)) => Err(PreprocessError::ZoneOrder {
                position,
                found: zone.id(),
            }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&Zone<I>> {
        self.zones.get(id.index())
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone<I>> {
        self.zones.get_mut(id.index())
    }

    /// Returns the zone ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = ZoneId> + use<I> {
        (0..self.zones.len()).map(ZoneId)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone<I>> {
        self.zones.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Zone<I>> {
        self.zones.iter_mut()
    }

    /// Returns a rayon iterator over the zones in index order.
    #[cfg(feature = "parallel")]
    pub fn par_iter_mut(&mut self) -> rayon::slice::IterMut<'_, Zone<I>>
    where
        Zone<I>: Send,
    {
        use rayon::prelude::*;

        self.zones.par_iter_mut()
    }

    #[must_use]
    pub fn into_zones(self) -> Vec<Zone<I>> {
        self.zones
    }
}

impl<I: Integration> fmt::Debug for ZoneSet<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.zones).finish()
    }
}

impl<I: Integration> Index<ZoneId> for ZoneSet<I> {
    type Output = Zone<I>;

    fn index(&self, id: ZoneId) -> &Self::Output {
        &self.zones[id.index()]
    }
}

impl<I: Integration> IndexMut<ZoneId> for ZoneSet<I> {
    fn index_mut(&mut self, id: ZoneId) -> &mut Self::Output {
        &mut self.zones[id.index()]
    }
}

impl<'a, I: Integration> IntoIterator for &'a ZoneSet<I> {
    type Item = &'a Zone<I>;
    type IntoIter = std::slice::Iter<'a, Zone<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

impl<'a, I: Integration> IntoIterator for &'a mut ZoneSet<I> {
    type Item = &'a mut Zone<I>;
    type IntoIter = std::slice::IterMut<'a, Zone<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::config::Equation;

    /// Counts how often each hook is called.
    #[derive(Debug, Default)]
    struct Counter {
        preprocessed: usize,
        advanced: usize,
        updated: usize,
    }

    impl Integration for Counter {
        type Geometry = ();
        type Solvers = f64;
        type Numerics = ();
        type Error = Infallible;

        fn preprocess(
            &mut self,
            _geometry: &mut (),
            _solvers: &mut f64,
            _numerics: &(),
            _config: &ZoneConfig,
            _step: usize,
        ) -> Result<(), Infallible> {
            self.preprocessed += 1;
            Ok(())
        }

        fn advance(
            &mut self,
            _geometry: &mut (),
            solvers: &mut f64,
            _numerics: &(),
            _config: &ZoneConfig,
            step: usize,
        ) -> Result<f64, Infallible> {
            self.advanced += 1;
            *solvers += 1.0;
            Ok(1.0 / (step + 1) as f64)
        }

        fn update(
            &mut self,
            _geometry: &mut (),
            _solvers: &mut f64,
            _numerics: &(),
            _config: &ZoneConfig,
            _step: usize,
        ) -> Result<(), Infallible> {
            self.updated += 1;
            Ok(())
        }
    }

    fn zone(id: usize) -> Zone<Counter> {
        Zone::new(
            ZoneId(id),
            ZoneConfig::new(vec![Equation::Flow]),
            (),
            0.0,
            Counter::default(),
            (),
        )
    }

    #[test]
    fn zone_routes_hooks_to_integration() {
        let mut zone = zone(0);

        zone.preprocess(3).unwrap();
        let residual = zone.advance(3).unwrap();
        zone.update(3).unwrap();

        assert_eq!(residual, 0.25);
        assert_eq!(*zone.solvers(), 1.0);
        assert_eq!(zone.integration().preprocessed, 1);
        assert_eq!(zone.integration().advanced, 1);
        assert_eq!(zone.integration().updated, 1);
    }

    #[test]
    fn zone_set_accepts_contiguous_ids() {
        let set = ZoneSet::new(vec![zone(0), zone(1), zone(2)]).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![ZoneId(0), ZoneId(1), ZoneId(2)]);
        assert_eq!(set[ZoneId(2)].id(), ZoneId(2));
        assert!(set.get(ZoneId(3)).is_none());
    }

    #[test]
    fn zone_set_rejects_gaps() {
        let err = ZoneSet::new(vec![zone(0), zone(2)]).unwrap_err();

        assert!(matches!(
            err,
            PreprocessError::ZoneOrder {
                position: 1,
                found: ZoneId(2)
            }
        ));
    }

    #[test]
    fn swapped_zones_fail_the_order_check() {
        let mut set = ZoneSet::new(vec![zone(0), zone(1), zone(2)]).unwrap();
        assert!(set.check_order().is_ok());

        let mut zones: Vec<_> = set.iter_mut().collect();
        if let [first, second, ..] = zones.as_mut_slice() {
            std::mem::swap(&mut **first, &mut **second);
        }

        assert!(matches!(
            set.check_order(),
            Err(PreprocessError::ZoneOrder {
                position: 0,
                found: ZoneId(1)
            })
        ));
    }
}
