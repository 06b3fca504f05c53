use crate::constants::{MAX_TRACKED_SESSIONS, SESSION_IDLE_TTL_SECONDS};
use crate::error::{AppError, Result};
use crate::models::{OptimizedRoute, RoutePoint};
use crate::services::intelligent_router::{IntelligentRouter, RouteOptions};
use moka::future::Cache;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Route builds for one client where only the newest request may finish.
///
/// Starting a build bumps the session generation. Builds still running for
/// an older generation are dropped at their next suspension point, which
/// cancels their outstanding upstream calls, and they return
/// [`AppError::Superseded`].
pub struct RouteSession {
    generation: watch::Sender<u64>,
    latest: Mutex<Option<(u64, Arc<OptimizedRoute>)>>,
}

impl RouteSession {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        RouteSession {
            generation,
            latest: Mutex::new(None),
        }
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Last route this session published.
    pub fn latest(&self) -> Option<Arc<OptimizedRoute>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, route)| Arc::clone(route))
    }

    pub async fn build(
        &self,
        router: &IntelligentRouter,
        from: RoutePoint,
        to: RoutePoint,
        options: &RouteOptions,
    ) -> Result<OptimizedRoute> {
        let this_generation = self.begin();
        self.run(this_generation, router.build_optimized_route(from, to, options))
            .await
    }

    fn begin(&self) -> u64 {
        let mut this_generation = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            this_generation = *generation;
        });
        this_generation
    }

    async fn run<F>(&self, this_generation: u64, build: F) -> Result<OptimizedRoute>
    where
        F: std::future::Future<Output = Result<OptimizedRoute>>,
    {
        let mut changes = self.generation.subscribe();

        let route = tokio::select! {
            result = build => result?,
            _ = superseded(&mut changes, this_generation) => {
                tracing::debug!(generation = this_generation, "Route build superseded");
                return Err(AppError::Superseded);
            }
        };

        self.publish(this_generation, route)
    }

    fn publish(&self, this_generation: u64, route: OptimizedRoute) -> Result<OptimizedRoute> {
        if self.generation() != this_generation {
            tracing::debug!(
                generation = this_generation,
                "Discarding route from superseded build"
            );
            return Err(AppError::Superseded);
        }

        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let is_newer = latest
            .as_ref()
            .map_or(true, |(published, _)| *published < this_generation);
        if is_newer {
            *latest = Some((this_generation, Arc::new(route.clone())));
        }

        Ok(route)
    }
}

impl Default for RouteSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once a newer generation than `this_generation` has started.
async fn superseded(changes: &mut watch::Receiver<u64>, this_generation: u64) {
    loop {
        if *changes.borrow_and_update() != this_generation {
            return;
        }
        if changes.changed().await.is_err() {
            // Sender gone: nothing can supersede this build any more.
            std::future::pending::<()>().await;
        }
    }
}

/// Sessions keyed by client id, dropped after a period of inactivity.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Cache<String, Arc<RouteSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_idle_timeout(Duration::from_secs(SESSION_IDLE_TTL_SECONDS))
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        SessionRegistry {
            sessions: Cache::builder()
                .max_capacity(MAX_TRACKED_SESSIONS)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    pub async fn session(&self, id: &str) -> Arc<RouteSession> {
        self.sessions
            .get_with(id.to_string(), async { Arc::new(RouteSession::new()) })
            .await
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.entry_count()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateRoute, RouteGeometry, RouteKind, RouteSummaryText};
    use tokio::sync::oneshot;

    fn optimized(distance_meters: f64) -> OptimizedRoute {
        let from = RoutePoint::new(55.7539, 37.6208).unwrap();
        let to = RoutePoint::new(55.7298, 37.6019).unwrap();
        let geometry = RouteGeometry {
            points: vec![from, to],
            distance_meters,
            duration_seconds: distance_meters / 1.4,
        };
        OptimizedRoute {
            summary: RouteSummaryText::for_geometry(&geometry),
            route: CandidateRoute::new(RouteKind::Direct, geometry, from, to, Vec::new()),
            priority_analysis: None,
            alternative_routes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_running_build() {
        let session = Arc::new(RouteSession::new());
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first_generation = session.begin();
        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .run(first_generation, async move {
                        let _ = release_rx.await;
                        Ok(optimized(1_000.0))
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;

        let second_generation = session.begin();
        let second = session
            .run(second_generation, async { Ok(optimized(2_000.0)) })
            .await
            .unwrap();

        let first = first.await.unwrap();
        assert!(matches!(first, Err(AppError::Superseded)));
        assert_eq!(second.route.geometry.distance_meters, 2_000.0);
        assert_eq!(
            session.latest().unwrap().route.geometry.distance_meters,
            2_000.0
        );
        // the first build was dropped without ever being released
        assert!(release_tx.is_closed());
    }

    #[tokio::test]
    async fn test_stale_result_is_not_published() {
        let session = RouteSession::new();

        let old_generation = session.begin();
        let _new_generation = session.begin();

        let result = session.publish(old_generation, optimized(1_000.0));
        assert!(matches!(result, Err(AppError::Superseded)));
        assert!(session.latest().is_none());
    }

    #[tokio::test]
    async fn test_single_build_publishes() {
        let session = RouteSession::new();
        let generation = session.begin();

        let route = session
            .run(generation, async { Ok(optimized(1_500.0)) })
            .await
            .unwrap();

        assert_eq!(route.route.geometry.distance_meters, 1_500.0);
        assert_eq!(session.generation(), 1);
        assert!(session.latest().is_some());
    }

    #[tokio::test]
    async fn test_build_errors_pass_through() {
        let session = RouteSession::new();
        let generation = session.begin();

        let result = session
            .run(generation, async {
                Err(AppError::NoRouteFound("nothing".to_string()))
            })
            .await;

        assert!(matches!(result, Err(AppError::NoRouteFound(_))));
        assert!(session.latest().is_none());
    }

    #[tokio::test]
    async fn test_registry_returns_same_session_per_id() {
        let registry = SessionRegistry::new();

        let a1 = registry.session("client-a").await;
        let a2 = registry.session("client-a").await;
        let b = registry.session("client-b").await;

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
