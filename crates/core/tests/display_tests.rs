// ═══════════════════════════════════════════════════════════════════
// Display Tests — event debouncing
// ═══════════════════════════════════════════════════════════════════

use std::time::{Duration, Instant};

use normalized_prices_core::display::debounce::{Debouncer, Edge, DEFAULT_DEBOUNCE_DELAY};

const DELAY: Duration = Duration::from_millis(100);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

mod trailing {
    use super::*;

    #[test]
    fn burst_releases_latest_payload_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::trailing(DELAY);

        assert_eq!(d.event(t0, 1), None);
        assert_eq!(d.event(t0 + ms(30), 2), None);
        assert_eq!(d.event(t0 + ms(60), 3), None);

        // Not quiet long enough since the last event.
        assert_eq!(d.poll(t0 + ms(150)), None);
        assert_eq!(d.poll(t0 + ms(160)), Some(3));
        assert_eq!(d.poll(t0 + ms(500)), None);
    }

    #[test]
    fn deadline_tracks_last_event() {
        let t0 = Instant::now();
        let mut d = Debouncer::trailing(DELAY);
        assert_eq!(d.deadline(), None);

        d.event(t0, "a");
        assert_eq!(d.deadline(), Some(t0 + DELAY));
        d.event(t0 + ms(40), "b");
        assert_eq!(d.deadline(), Some(t0 + ms(140)));
        assert!(d.has_pending());
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::trailing(DELAY);
        d.event(t0, 7);
        assert_eq!(d.cancel(), Some(7));
        assert!(!d.has_pending());
        assert_eq!(d.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn default_is_trailing_100ms() {
        let d: Debouncer<()> = Debouncer::default();
        assert_eq!(d.edge(), Edge::Trailing);
        assert_eq!(d.delay(), DEFAULT_DEBOUNCE_DELAY);
        assert_eq!(d.delay(), ms(100));
    }
}

mod leading {
    use super::*;

    #[test]
    fn first_event_passes_rest_of_burst_dropped() {
        let t0 = Instant::now();
        let mut d = Debouncer::leading(DELAY);

        assert_eq!(d.event(t0, 1), Some(1));
        assert_eq!(d.event(t0 + ms(50), 2), None);
        assert_eq!(d.event(t0 + ms(120), 3), None);
        assert_eq!(d.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn passes_again_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::leading(DELAY);

        assert_eq!(d.event(t0, 1), Some(1));
        assert_eq!(d.event(t0 + ms(100), 2), Some(2));
        assert_eq!(d.event(t0 + ms(150), 3), None);
        assert_eq!(d.event(t0 + ms(300), 4), Some(4));
    }

    #[test]
    fn never_holds_payload() {
        let mut d = Debouncer::new(DELAY, Edge::Leading);
        d.event(Instant::now(), "x");
        assert!(!d.has_pending());
        assert_eq!(d.deadline(), None);
    }
}
