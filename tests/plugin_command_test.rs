mod common;

use common::{FakeConnector, FakeSessy, settings};
use sessy_bridge::config::PluginConfig;
use sessy_bridge::error::SessyError;
use sessy_bridge::host::MemoryHost;
use sessy_bridge::plugin::SessyPlugin;
use std::sync::Arc;
use std::sync::atomic::Ordering;

const NAMES: [&str; 4] = ["Sessy A", "Sessy B", "Sessy C", "Sessy D"];

fn four_batteries() -> Arc<FakeConnector> {
    let connector = NAMES.iter().fold(FakeConnector::default(), |c, name| {
        c.with(FakeSessy::battery(name, 0.5, 0))
    });
    Arc::new(connector)
}

fn started(connector: &Arc<FakeConnector>, settings: PluginConfig) -> (SessyPlugin, MemoryHost) {
    let mut plugin = SessyPlugin::new(settings, connector.clone());
    let mut host = MemoryHost::new();
    plugin
        .start_with_devices(&mut host, connector.device_file())
        .unwrap();
    (plugin, host)
}

#[tokio::test]
async fn system_setpoint_is_split_across_batteries() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    plugin
        .on_command("System", 6, "Set Level", 1000.0)
        .await
        .unwrap();

    for name in NAMES {
        assert_eq!(connector.get(name).sent(), vec!["setpoint 250"], "{}", name);
    }
}

#[tokio::test]
async fn battery_setpoint_is_sent_literally() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    plugin
        .on_command("Sessy B", 6, "Set Level", -800.0)
        .await
        .unwrap();

    assert_eq!(connector.get("Sessy B").sent(), vec!["setpoint -800"]);
    assert!(connector.get("Sessy A").sent().is_empty());
}

#[tokio::test]
async fn switching_setpoint_off_sends_zero() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    plugin.on_command("Sessy C", 6, "Off", 0.0).await.unwrap();
    assert_eq!(connector.get("Sessy C").sent(), vec!["setpoint 0"]);

    let err = plugin.on_command("Sessy C", 6, "On", 0.0).await.unwrap_err();
    assert!(matches!(err, SessyError::Command { .. }));
}

#[tokio::test]
async fn system_strategy_is_broadcast() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    plugin
        .on_command("System", 5, "Set Level", 40.0)
        .await
        .unwrap();

    for name in NAMES {
        assert_eq!(
            connector.get(name).sent(),
            vec!["strategy POWER_STRATEGY_IDLE"]
        );
    }
}

#[tokio::test]
async fn battery_strategy_is_targeted() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    plugin
        .on_command("Sessy D", 5, "Set Level", 30.0)
        .await
        .unwrap();

    assert_eq!(
        connector.get("Sessy D").sent(),
        vec!["strategy POWER_STRATEGY_API"]
    );
    assert!(connector.get("Sessy A").sent().is_empty());
}

#[tokio::test]
async fn invalid_commands_send_nothing() {
    let connector = four_batteries();
    let (mut plugin, _host) = started(&connector, settings());

    // Mixed is not a strategy
    let err = plugin
        .on_command("System", 5, "Set Level", 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::UnknownStrategy { .. }));

    let err = plugin
        .on_command("Sessy X", 6, "Set Level", 100.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Command { .. }));

    let err = plugin
        .on_command("Sessy A", 2, "Set Level", 100.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Command { .. }));

    let err = plugin
        .on_command("Sessy A", 6, "Toggle", 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Command { .. }));

    for name in NAMES {
        assert!(connector.get(name).sent().is_empty());
    }
}

#[tokio::test]
async fn commands_need_a_running_plugin() {
    let connector = four_batteries();
    let mut plugin = SessyPlugin::new(settings(), connector.clone());

    let err = plugin
        .on_command("System", 6, "Set Level", 1000.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Command { .. }));
}

#[tokio::test(start_paused = true)]
async fn command_forces_next_poll() {
    let connector = Arc::new(FakeConnector::default().with(FakeSessy::battery("Sessy A", 0.5, 0)));
    let settings = PluginConfig {
        refresh_ticks: 6,
        ..settings()
    };
    let (mut plugin, mut host) = started(&connector, settings);
    let battery = connector.get("Sessy A");

    plugin.on_heartbeat(&mut host).await.unwrap();
    plugin.on_heartbeat(&mut host).await.unwrap();
    assert_eq!(battery.status_calls.load(Ordering::SeqCst), 1);

    plugin
        .on_command("Sessy A", 5, "Set Level", 20.0)
        .await
        .unwrap();
    plugin.on_heartbeat(&mut host).await.unwrap();
    assert_eq!(battery.status_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn broadcast_reaches_batteries_after_a_failure() {
    let connector = Arc::new(
        FakeConnector::default()
            .with(FakeSessy::battery("Sessy A", 0.5, 0).rejecting())
            .with(FakeSessy::battery("Sessy B", 0.5, 0))
            .with(FakeSessy::battery("Sessy C", 0.5, 0).rejecting()),
    );
    let (mut plugin, _host) = started(&connector, settings());

    let err = plugin
        .on_command("System", 5, "Set Level", 30.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Request { status: 500, .. }));
    assert_eq!(
        connector.get("Sessy B").sent(),
        vec!["strategy POWER_STRATEGY_API"]
    );

    let err = plugin
        .on_command("System", 6, "Set Level", 900.0)
        .await
        .unwrap_err();
    assert!(matches!(err, SessyError::Request { .. }));
    assert_eq!(
        connector.get("Sessy B").sent(),
        vec!["strategy POWER_STRATEGY_API", "setpoint 300"]
    );
}
