//! Initial placement through the mapper, including solvers that overrun.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{assert_adjacent, kernel, linear, options};
use qmap_mapper::{
    InitialPlace, MapError, Mapper, PlaceOutcome, PlacementProblem, PlacementSolver, QapPlacer,
};

/// Far-apart pairs on a line of five.
fn far_pairs() -> qmap_ir::Kernel {
    kernel(
        5,
        &[
            ("x", &[0]),
            ("x", &[4]),
            ("cz", &[0, 4]),
            ("cz", &[4, 0]),
            ("cz", &[0, 4]),
        ],
    )
}

fn limited(millis: u64, abort_on_timeout: bool) -> InitialPlace {
    InitialPlace::Limited {
        limit: Duration::from_millis(millis),
        abort_on_timeout,
    }
}

/// Sleeps past any reasonable limit, then answers like the default solver.
#[derive(Debug)]
struct Slow(Duration);

impl PlacementSolver for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    fn solve(&self, problem: &PlacementProblem) -> Option<Vec<usize>> {
        std::thread::sleep(self.0);
        QapPlacer.solve(problem)
    }
}

#[derive(Debug, Default)]
struct Counting {
    calls: AtomicUsize,
}

impl PlacementSolver for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn solve(&self, problem: &PlacementProblem) -> Option<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        QapPlacer.solve(problem)
    }
}

#[derive(Debug)]
struct Hopeless;

impl PlacementSolver for Hopeless {
    fn name(&self) -> &str {
        "hopeless"
    }

    fn solve(&self, _problem: &PlacementProblem) -> Option<Vec<usize>> {
        None
    }
}

/// Puts every facility on the same location.
#[derive(Debug)]
struct Crowding;

impl PlacementSolver for Crowding {
    fn name(&self) -> &str {
        "crowding"
    }

    fn solve(&self, problem: &PlacementProblem) -> Option<Vec<usize>> {
        Some(vec![0; problem.facilities()])
    }
}

#[tokio::test]
async fn test_new_map_removes_routing() {
    let mapper = Mapper::new(linear(5), options(&["initialplace=yes", "mapusemoves=no"])).unwrap();
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::NewMap));
    assert_ne!(report.v2r_ip, report.v2r_in);
    assert_eq!(report.swaps_added, 0);
    assert_adjacent(mapper.grid(), &k);
}

#[tokio::test]
async fn test_slow_solver_times_out_and_mapping_goes_on() {
    let mut opts = options(&["mapusemoves=no"]);
    opts.initial_place = limited(30, false);
    let mapper = Mapper::new(linear(5), opts)
        .unwrap()
        .with_solver(Arc::new(Slow(Duration::from_millis(400))));
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::TimedOut));
    assert_eq!(report.v2r_ip, report.v2r_in);
    assert!(report.swaps_added > 0);
    assert_adjacent(mapper.grid(), &k);
}

#[tokio::test]
async fn test_slow_solver_aborts_when_asked() {
    let mut opts = options(&[]);
    opts.initial_place = limited(30, true);
    let mapper = Mapper::new(linear(5), opts)
        .unwrap()
        .with_solver(Arc::new(Slow(Duration::from_millis(400))));
    let mut k = far_pairs();
    let before = k.clone();

    let err = mapper.map_with_placement(&mut k).await.unwrap_err();

    assert!(matches!(err, MapError::PlacementTimedOut(_)));
    assert_eq!(k, before);
}

#[tokio::test]
async fn test_solver_in_time_is_used() {
    let mut opts = options(&["mapusemoves=no"]);
    opts.initial_place = limited(5_000, true);
    let mapper = Mapper::new(linear(5), opts)
        .unwrap()
        .with_solver(Arc::new(Slow(Duration::from_millis(10))));
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::NewMap));
    assert_eq!(report.swaps_added, 0);
}

#[tokio::test]
async fn test_failed_placement_keeps_mapping() {
    let mapper = Mapper::new(linear(5), options(&["initialplace=yes", "mapusemoves=no"]))
        .unwrap()
        .with_solver(Arc::new(Hopeless));
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::Failed));
    assert_eq!(report.v2r_ip, report.v2r_in);
    assert_adjacent(mapper.grid(), &k);
}

#[tokio::test]
async fn test_shared_locations_are_rejected() {
    let mapper = Mapper::new(linear(5), options(&["initialplace=yes", "mapusemoves=no"]))
        .unwrap()
        .with_solver(Arc::new(Crowding));
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::Failed));
    assert_eq!(report.v2r_ip, report.v2r_in);
    assert!(report.swaps_added > 0);
    assert_adjacent(mapper.grid(), &k);
}

#[tokio::test]
async fn test_disabled_placement_never_calls_solver() {
    let solver = Arc::new(Counting::default());
    let mapper = Mapper::new(linear(5), options(&["initialplace=no"]))
        .unwrap()
        .with_solver(solver.clone());
    let mut k = far_pairs();

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, None);
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_adjacent_kernel_skips_solver() {
    let solver = Arc::new(Counting::default());
    let mapper = Mapper::new(linear(5), options(&["initialplace=yes"]))
        .unwrap()
        .with_solver(solver.clone());
    let mut k = kernel(5, &[("cz", &[0, 1]), ("cz", &[3, 4]), ("x", &[2])]);

    let report = mapper.map_with_placement(&mut k).await.unwrap();

    assert_eq!(report.placement, Some(PlaceOutcome::Current));
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_sync_entry_point_skips_placement() {
    let solver = Arc::new(Counting::default());
    let mapper = Mapper::new(linear(5), options(&["initialplace=yes", "mapusemoves=no"]))
        .unwrap()
        .with_solver(solver.clone());
    let mut k = far_pairs();

    let report = mapper.map(&mut k).unwrap();

    assert_eq!(report.placement, None);
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
    assert!(report.swaps_added > 0);
}
