use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ivp_md::*;

struct CountingSource {
    loads: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ReferenceSource for CountingSource {
    async fn load(&self) -> Result<Vec<InstrumentInfo>, ProviderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Transport("board list unreachable".into()));
        }
        Ok(vec![
            InstrumentInfo::new("BK0145", "90", "Shanghai", InstrumentKind::Region),
            InstrumentInfo::new("600519", "1", "Kweichow Moutai", InstrumentKind::Stock),
        ])
    }
}

#[tokio::test]
async fn scenario_reference_data_loaded_once() {
    let src = CountingSource {
        loads: AtomicUsize::new(0),
        fail: false,
    };
    let data = ReferenceData::load(&src).await.unwrap();

    for _ in 0..3 {
        assert_eq!(data.name("600519"), Some("Kweichow Moutai"));
        assert_eq!(data.kind("BK0145"), Some(InstrumentKind::Region));
    }
    assert_eq!(src.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_reference_load_failure_propagates() {
    let src = CountingSource {
        loads: AtomicUsize::new(0),
        fail: true,
    };
    let err = ReferenceData::load(&src).await.unwrap_err();
    assert!(err.is_retryable());
}
