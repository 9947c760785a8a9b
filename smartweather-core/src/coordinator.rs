//! Request coordination for the current-weather screen.
//!
//! One coordinator owns everything the screen shows: the active page, the
//! per-favorite page cache, and every in-flight fetch. Each request slot
//! (the active view, or one favorite page) has at most one outstanding
//! fetch; issuing a new request in a slot supersedes the previous one.
//!
//! Superseded fetches are aborted as an optimization, but correctness does
//! not depend on the abort landing in time: every fetch captures a
//! generation token for its slot at issue time, and the token is compared
//! against the slot's current generation at the application point, under
//! the coordinator lock. A fetch that already holds a response when it is
//! superseded discards it there.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::cache::FavoriteStateCache;
use crate::display::{self, DisplayState};
use crate::gateway::WeatherGateway;
use crate::location::{LocationError, LocationSource};
use crate::model::{
    AirQuality, CityKey, Coordinates, FavoriteCity, LocationDescriptor, TemperatureUnit, Weather,
};

const MY_LOCATION_LABEL: &str = "My location";

/// Which page of the screen is in front.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Focus {
    Active,
    Favorite(CityKey),
}

/// One request slot. Requests in the same slot supersede each other;
/// requests in different slots are independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Active,
    Favorite(CityKey),
}

#[derive(Debug, Clone)]
enum FetchTarget {
    City(String),
    Coordinates {
        coordinates: Coordinates,
        label: String,
    },
}

type FetchSuccess = (String, Weather, Option<AirQuality>);

#[derive(Debug)]
struct Inner {
    unit: TemperatureUnit,
    last_source: Option<LocationDescriptor>,
    has_loaded: bool,
    focus: Focus,
    active_state: DisplayState,
    cache: FavoriteStateCache,
    generations: HashMap<Slot, u64>,
    in_flight: HashMap<Slot, AbortHandle>,
    next_generation: u64,
}

#[derive(Debug)]
struct Shared {
    gateway: Arc<dyn WeatherGateway>,
    location: Arc<dyn LocationSource>,
    state_tx: watch::Sender<DisplayState>,
    inner: Mutex<Inner>,
}

/// Coordinates weather refreshes for one current-weather screen.
#[derive(Debug)]
pub struct WeatherCoordinator {
    shared: Arc<Shared>,
}

impl WeatherCoordinator {
    pub fn new(
        gateway: Arc<dyn WeatherGateway>,
        location: Arc<dyn LocationSource>,
        unit: TemperatureUnit,
    ) -> Self {
        let (state_tx, _) = watch::channel(DisplayState::default());
        Self {
            shared: Arc::new(Shared {
                gateway,
                location,
                state_tx,
                inner: Mutex::new(Inner {
                    unit,
                    last_source: None,
                    has_loaded: false,
                    focus: Focus::Active,
                    active_state: DisplayState::default(),
                    cache: FavoriteStateCache::default(),
                    generations: HashMap::new(),
                    in_flight: HashMap::new(),
                    next_generation: 0,
                }),
            }),
        }
    }

    /// Observe the currently-visible display state. Receivers read
    /// snapshots; no coordinator lock is involved on the render path.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.shared.state_tx.subscribe()
    }

    pub fn visible_state(&self) -> DisplayState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.shared.lock().unit
    }

    pub fn cached_state(&self, key: &CityKey) -> Option<DisplayState> {
        self.shared.lock().cache.get(key).cloned()
    }

    pub fn request_by_city(&self, name: &str) {
        debug!(city = %name, "requesting weather by city name");
        let shared = &self.shared;
        let mut inner = shared.lock();
        inner.last_source = Some(LocationDescriptor::ByCityName(name.to_owned()));
        shared.set_active(&mut inner, DisplayState::loading());
        let generation = begin(&mut inner, &Slot::Active);
        spawn_conditions(
            shared,
            &mut inner,
            Slot::Active,
            generation,
            FetchTarget::City(name.to_owned()),
            None,
        );
    }

    pub fn request_by_coordinates(&self, coordinates: Coordinates, label: &str) {
        debug!(%coordinates, "requesting weather by coordinates");
        let shared = &self.shared;
        let mut inner = shared.lock();
        inner.last_source = Some(LocationDescriptor::ByCoordinates {
            coordinates,
            label: label.to_owned(),
        });
        shared.set_active(&mut inner, DisplayState::loading());
        let generation = begin(&mut inner, &Slot::Active);
        spawn_conditions(
            shared,
            &mut inner,
            Slot::Active,
            generation,
            FetchTarget::Coordinates {
                coordinates,
                label: label.to_owned(),
            },
            None,
        );
    }

    /// Refresh from the device position. The loading indicator is skipped
    /// when data is already on screen, so an in-place refresh does not
    /// flicker. Failures leave the last-requested source untouched.
    pub fn request_device_location(&self) {
        debug!("requesting weather for device location");
        let shared = &self.shared;
        let mut inner = shared.lock();
        start_device_request(shared, &mut inner);
    }

    /// Record the new unit and, once anything has loaded, replay the most
    /// recently requested source so the screen reflects the new unit.
    pub fn on_unit_changed(&self, unit: TemperatureUnit) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.unit == unit {
            return;
        }
        inner.unit = unit;

        // Cached favorite strings embed the old unit symbol, and any
        // favorite fetch still in flight would complete in the old unit.
        inner.cache.clear();
        let stale: Vec<Slot> = inner
            .in_flight
            .keys()
            .filter(|slot| matches!(slot, Slot::Favorite(_)))
            .cloned()
            .collect();
        for slot in stale {
            if let Some(handle) = inner.in_flight.remove(&slot) {
                handle.abort();
            }
            inner.generations.remove(&slot);
        }

        if !inner.has_loaded {
            return;
        }
        let Some(source) = inner.last_source.clone() else {
            return;
        };
        debug!(?source, "unit changed, replaying last request");
        match source {
            LocationDescriptor::ByCityName(name) => {
                shared.set_active(&mut inner, DisplayState::loading());
                let generation = begin(&mut inner, &Slot::Active);
                spawn_conditions(
                    shared,
                    &mut inner,
                    Slot::Active,
                    generation,
                    FetchTarget::City(name),
                    None,
                );
            }
            LocationDescriptor::ByCoordinates { coordinates, label } => {
                shared.set_active(&mut inner, DisplayState::loading());
                let generation = begin(&mut inner, &Slot::Active);
                spawn_conditions(
                    shared,
                    &mut inner,
                    Slot::Active,
                    generation,
                    FetchTarget::Coordinates { coordinates, label },
                    None,
                );
            }
            LocationDescriptor::CurrentDevice => start_device_request(shared, &mut inner),
        }
    }

    /// Focus a favorite page. A cached state renders immediately without a
    /// refetch; otherwise a fetch is issued in the favorite's own slot.
    pub fn show_favorite(&self, city: &FavoriteCity) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        let key = city.key();
        inner.focus = Focus::Favorite(key.clone());

        if let Some(state) = inner.cache.get(&key).cloned() {
            shared.state_tx.send_replace(state);
            return;
        }

        shared.state_tx.send_replace(DisplayState::loading());
        let slot = Slot::Favorite(key);
        if inner.in_flight.contains_key(&slot) {
            // This page's fetch is already running; it renders on completion.
            return;
        }
        let generation = begin(&mut inner, &slot);
        spawn_conditions(
            shared,
            &mut inner,
            slot,
            generation,
            FetchTarget::Coordinates {
                coordinates: city.coordinates(),
                label: city.title(),
            },
            None,
        );
    }

    /// Refocus the active page and restore whatever it last showed.
    pub fn show_active(&self) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        inner.focus = Focus::Active;
        let state = inner.active_state.clone();
        shared.state_tx.send_replace(state);
    }

    /// React to the favorites list changing: purge cache entries and
    /// supersede in-flight fetches for cities that are no longer favorites.
    pub fn on_favorites_changed(&self, favorites: &[FavoriteCity]) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        let valid: HashSet<CityKey> = favorites.iter().map(FavoriteCity::key).collect();
        inner.cache.prune(&valid);

        let stale: Vec<Slot> = inner
            .in_flight
            .keys()
            .filter(|slot| matches!(slot, Slot::Favorite(key) if !valid.contains(key)))
            .cloned()
            .collect();
        for slot in stale {
            if let Some(handle) = inner.in_flight.remove(&slot) {
                handle.abort();
            }
            inner.generations.remove(&slot);
        }

        let focused_removed =
            matches!(&inner.focus, Focus::Favorite(key) if !valid.contains(key));
        if focused_removed {
            inner.focus = Focus::Active;
            let state = inner.active_state.clone();
            shared.state_tx.send_replace(state);
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("coordinator state poisoned")
    }

    fn set_active(&self, inner: &mut Inner, state: DisplayState) {
        inner.active_state = state.clone();
        self.show_if_focused(inner, &Slot::Active, &state);
    }

    fn show_if_focused(&self, inner: &Inner, slot: &Slot, state: &DisplayState) {
        let focused = match (slot, &inner.focus) {
            (Slot::Active, Focus::Active) => true,
            (Slot::Favorite(key), Focus::Favorite(focused)) => key == focused,
            _ => false,
        };
        if focused {
            self.state_tx.send_replace(state.clone());
        }
    }

    /// Apply a fetch outcome. This is the single point where the
    /// issue-time generation is checked against the slot's current one;
    /// superseded results are discarded here regardless of how far the
    /// fetch got.
    fn apply(
        &self,
        slot: Slot,
        generation: u64,
        unit: TemperatureUnit,
        outcome: anyhow::Result<FetchSuccess>,
        source_on_success: Option<LocationDescriptor>,
    ) {
        let mut inner = self.lock();
        if inner.generations.get(&slot) != Some(&generation) {
            debug!(?slot, generation, "discarding superseded fetch result");
            return;
        }
        inner.in_flight.remove(&slot);

        match outcome {
            Ok((label, weather, air)) => {
                let state = display::loaded(&label, &weather, air.as_ref(), unit);
                match &slot {
                    Slot::Active => {
                        if let Some(source) = source_on_success {
                            inner.last_source = Some(source);
                        }
                        inner.has_loaded = true;
                        inner.active_state = state.clone();
                    }
                    Slot::Favorite(key) => {
                        // The key was bound at issue time; focus only
                        // decides whether the result is also shown.
                        inner.cache.put(key.clone(), state.clone());
                    }
                }
                self.show_if_focused(&inner, &slot, &state);
            }
            Err(err) => {
                warn!(error = %err, ?slot, "weather fetch failed");
                let state = DisplayState::failed(err.to_string());
                if slot == Slot::Active {
                    inner.active_state = state.clone();
                }
                // Error states are never cached for favorite pages.
                self.show_if_focused(&inner, &slot, &state);
            }
        }
    }
}

/// Bump the slot's generation and abort its previous fetch, if any.
fn begin(inner: &mut Inner, slot: &Slot) -> u64 {
    inner.next_generation += 1;
    let generation = inner.next_generation;
    inner.generations.insert(slot.clone(), generation);
    if let Some(handle) = inner.in_flight.remove(slot) {
        handle.abort();
    }
    generation
}

fn spawn_conditions(
    shared: &Arc<Shared>,
    inner: &mut Inner,
    slot: Slot,
    generation: u64,
    target: FetchTarget,
    source_on_success: Option<LocationDescriptor>,
) {
    let unit = inner.unit;
    let task_shared = Arc::clone(shared);
    let task_slot = slot.clone();
    let handle = tokio::spawn(async move {
        let outcome = fetch_conditions(task_shared.gateway.as_ref(), &target, unit).await;
        task_shared.apply(task_slot, generation, unit, outcome, source_on_success);
    });
    inner.in_flight.insert(slot, handle.abort_handle());
}

fn start_device_request(shared: &Arc<Shared>, inner: &mut Inner) {
    if !inner.active_state.is_loaded() {
        shared.set_active(inner, DisplayState::loading());
    }
    let generation = begin(inner, &Slot::Active);
    let unit = inner.unit;
    let task_shared = Arc::clone(shared);
    let handle = tokio::spawn(async move {
        match task_shared.location.current_location().await {
            Ok(Some(coordinates)) => {
                let target = FetchTarget::Coordinates {
                    coordinates,
                    label: MY_LOCATION_LABEL.to_owned(),
                };
                let outcome = fetch_conditions(task_shared.gateway.as_ref(), &target, unit).await;
                let source = LocationDescriptor::ByCoordinates {
                    coordinates,
                    label: MY_LOCATION_LABEL.to_owned(),
                };
                task_shared.apply(Slot::Active, generation, unit, outcome, Some(source));
            }
            Ok(None) => task_shared.apply(
                Slot::Active,
                generation,
                unit,
                Err(LocationError::Unavailable.into()),
                None,
            ),
            Err(err) => {
                task_shared.apply(Slot::Active, generation, unit, Err(err.into()), None);
            }
        }
    });
    inner.in_flight.insert(Slot::Active, handle.abort_handle());
}

/// Fetch current conditions, then best-effort air quality for the returned
/// coordinates. An air quality failure degrades to "no data" instead of
/// failing the whole refresh.
async fn fetch_conditions(
    gateway: &dyn WeatherGateway,
    target: &FetchTarget,
    unit: TemperatureUnit,
) -> anyhow::Result<FetchSuccess> {
    let (label, weather) = match target {
        FetchTarget::City(name) => (name.clone(), gateway.current_by_city(name, unit).await?),
        FetchTarget::Coordinates { coordinates, label } => (
            label.clone(),
            gateway.current_by_coordinates(*coordinates, unit).await?,
        ),
    };

    let air = match gateway.air_quality(weather.coordinates).await {
        Ok(air) => air,
        Err(err) => {
            warn!(error = %err, "air quality fetch failed");
            None
        }
    };

    Ok((label, weather, air))
}
