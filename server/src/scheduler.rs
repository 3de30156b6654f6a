use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::registry::Registry;

pub fn spawn_ticker(registry: Arc<Registry>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick_interval = interval(period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Ticking rooms every {:?}", period);

        loop {
            tick_interval.tick().await;
            registry.tick_all().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        game::Game, room_code::testing::ScriptedCodes, session::Room,
        transport::testing::RecordingTransport,
    };

    struct Counter(Arc<AtomicUsize>);

    impl Game for Counter {
        fn tick(&mut self, _room: &mut Room) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn ticker_drives_every_room() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(Registry::new(
            RecordingTransport::new(),
            Box::new(ScriptedCodes::new(&["AAAA", "BBBB"])),
            4,
        ));
        registry.register(Box::new(Counter(ticks.clone()))).await;
        registry.register(Box::new(Counter(ticks.clone()))).await;

        let ticker = spawn_ticker(registry.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        ticker.abort();

        let count = ticks.load(Ordering::SeqCst);
        assert!(count >= 4, "only {} ticks", count);
    }
}
