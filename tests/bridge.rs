use std::{fs, path::Path, sync::Arc};

use kconfig_bridge::{
    Backend, BridgeConfig, BroadcastBus, ButtonBinding, Color, Edges, KeyBinding, Modifiers, Setting,
    SettingId, SettingType, SettingValue, SettingsContext, Value, ValueKind,
};
use rstest::rstest;
use tokio::sync::broadcast::error::TryRecvError;

fn config(dir: &Path) -> BridgeConfig {
    BridgeConfig { watch_files: false, ..BridgeConfig::with_dir(dir) }
}

fn backend(dir: &Path, ctx: &SettingsContext) -> (Backend, BroadcastBus) {
    let bus = BroadcastBus::default();
    let backend = Backend::init(&config(dir), ctx, Arc::new(bus.clone())).unwrap();
    (backend, bus)
}

fn set(ctx: &mut SettingsContext, id: &SettingId, v: impl Into<SettingValue>) {
    assert!(ctx.get_mut(id).unwrap().set(v.into()));
}

#[test]
fn plain_setting_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::screen("expo", "zoom_time", 0);
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::int(id.clone(), 5));
    set(&mut ctx, &id, Value::Int(17));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    let mut fresh = SettingsContext::new("");
    fresh.add(Setting::int(id.clone(), 5));
    b.read_all(&mut fresh).unwrap();
    assert_eq!(fresh.get(&id).unwrap().as_int(), Some(17));
}

#[rstest]
#[case(ValueKind::String, vec![Value::String("a".into()), Value::String("b c".into())])]
#[case(ValueKind::Match, vec![Value::Match("class=XTerm".into()), Value::Match("any".into())])]
#[case(ValueKind::Int, vec![Value::Int(3), Value::Int(-1), Value::Int(3)])]
#[case(ValueKind::Float, vec![Value::Float(0.5), Value::Float(1.25)])]
#[case(ValueKind::Bool, vec![Value::Bool(true), Value::Bool(false)])]
#[case(ValueKind::Color, vec![Value::Color(Color::rgba(0xffff, 0, 0x8080, 0xffff)), Value::Color(Color::OPAQUE_BLACK)])]
#[case(ValueKind::Key, vec![Value::Key(KeyBinding::new("F1", Modifiers::ALT)), Value::Key(KeyBinding::default())])]
#[case(ValueKind::Button, vec![Value::Button(ButtonBinding { button: 2, modifiers: Modifiers::SUPER })])]
#[case(ValueKind::Edge, vec![Value::Edge(Edges::LEFT | Edges::TOP), Value::Edge(Edges::empty())])]
#[case(ValueKind::Bell, vec![Value::Bell(false), Value::Bell(true)])]
fn lists_of_every_kind_round_trip(#[case] kind: ValueKind, #[case] items: Vec<Value>) {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::screen("extra", "items", 0);
    let ty = SettingType::List(kind);
    let empty = SettingValue::List(vec![]);
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::new(id.clone(), ty, empty.clone()).unwrap());
    set(&mut ctx, &id, SettingValue::List(items.clone()));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    let mut fresh = SettingsContext::new("");
    fresh.add(Setting::new(id.clone(), ty, empty).unwrap());
    b.read_all(&mut fresh).unwrap();
    assert_eq!(fresh.get(&id).unwrap().value(), &SettingValue::List(items));
}

#[test]
fn cleared_keys_read_back_empty() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("core", "unmaximize_window_key");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::key(id.clone(), KeyBinding::new("F5", Modifiers::ALT)));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.read_all(&mut ctx).unwrap();
    assert_eq!(ctx.get(&id).unwrap().as_key(), Some(&KeyBinding::default()));
}

#[test]
fn modifier_only_switcher_chord_selects_style() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("switcher", "next_no_popup_key");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::key(id.clone(), KeyBinding::default()));
    set(&mut ctx, &id, Value::Key(KeyBinding { keysym: None, modifiers: Modifiers::SUPER }));

    let (mut b, bus) = backend(dir.path(), &ctx);
    let mut rx = bus.subscribe();
    b.write_init(&ctx).unwrap();
    b.write_setting(&ctx, &id);
    assert!(b.is_modified());
    b.write_done().unwrap();
    assert!(rx.try_recv().is_ok());
    assert_eq!(b.stores().session().read_string("Windows", "AltTabStyle").as_deref(), Some("CDE"));
}

#[rstest]
#[case(0, "Opaque", 0)]
#[case(1, "Transparent", 1)]
#[case(2, "Transparent", 2)]
#[case(3, "Opaque", 3)]
fn resize_mode_round_trips(#[case] mode: i32, #[case] session: &str, #[case] expected: i32) {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("resize", "mode");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::int(id.clone(), 0));
    set(&mut ctx, &id, Value::Int(mode));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();
    assert_eq!(b.stores().session().read_string("Windows", "ResizeMode").as_deref(), Some(session));

    set(&mut ctx, &id, Value::Int(-1));
    b.read_all(&mut ctx).unwrap();
    assert_eq!(ctx.get(&id).unwrap().as_int(), Some(expected));
}

#[test]
fn resize_mode_without_shadow_reads_opaque_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("kwinrc"), "[Windows]\nResizeMode = \"Opaque\"\n").unwrap();
    let id = SettingId::display("resize", "mode");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::int(id.clone(), 2));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.read_all(&mut ctx).unwrap();
    assert_eq!(ctx.get(&id).unwrap().as_int(), Some(0));
}

fn snap_context(categories: &[i32], distance: i32) -> SettingsContext {
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::int_list(SettingId::screen("snap", "edges_categories", 0), categories));
    ctx.add(Setting::int(SettingId::screen("snap", "resistance_distance", 0), distance));
    ctx
}

#[rstest]
#[case(&[0, 1], 5, 5, 5)]
#[case(&[0], 5, 5, 0)]
#[case(&[1], 5, 0, 5)]
#[case(&[], 5, 0, 0)]
fn snap_zones_follow_categories(
    #[case] categories: &[i32],
    #[case] distance: i32,
    #[case] border: i64,
    #[case] window: i64,
) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = snap_context(categories, distance);
    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    let kwinrc = fs::read_to_string(dir.path().join("kwinrc")).unwrap();
    assert!(kwinrc.contains(&format!("BorderSnapZone = {border}")), "{kwinrc}");
    assert!(kwinrc.contains(&format!("WindowSnapZone = {window}")), "{kwinrc}");
}

#[test]
fn read_only_setting_leaves_stores_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("commands", "command11");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::string(id.clone(), "my-killer"));

    let (mut b, bus) = backend(dir.path(), &ctx);
    let mut rx = bus.subscribe();
    assert!(b.is_read_only(&ctx, &id));
    b.write_all(&ctx).unwrap();
    assert!(!b.is_modified());
    assert!(!dir.path().join("kwinrc").exists());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    b.read_all(&mut ctx).unwrap();
    assert_eq!(ctx.get(&id).unwrap().value(), &SettingValue::from(Value::String("xkill".into())));
}

#[test]
fn unchanged_write_sends_no_reload() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("core", "autoraise");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::bool(id.clone(), true));

    let (mut b, bus) = backend(dir.path(), &ctx);
    let mut rx = bus.subscribe();
    b.write_all(&ctx).unwrap();
    let first = rx.try_recv().unwrap();
    assert_eq!(first.files, vec![dir.path().join("kwinrc"), dir.path().join("kglobalshortcutsrc")]);

    b.write_all(&ctx).unwrap();
    assert!(!b.is_modified());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn profile_switch_reads_the_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("core", "hsize");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::int(id.clone(), 4));
    set(&mut ctx, &id, Value::Int(2));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    ctx.set_profile("work");
    b.read_all(&mut ctx).unwrap();
    assert_eq!(b.profile(), "work");
    assert!(dir.path().join("compizrc.work").exists());
    assert_eq!(ctx.get(&id).unwrap().as_int(), Some(4));

    set(&mut ctx, &id, Value::Int(8));
    b.write_all(&ctx).unwrap();
    ctx.set_profile("");
    b.read_all(&mut ctx).unwrap();
    assert_eq!(ctx.get(&id).unwrap().as_int(), Some(2));
    assert_eq!(b.list_profiles(), vec!["work"]);
}

#[test]
fn external_edit_refreshes_settings() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("core", "click_to_focus");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::bool(id.clone(), true));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    let kwinrc = dir.path().join("kwinrc");
    b.watcher().trigger(&kwinrc);
    assert!(!b.process_events(&mut ctx).unwrap());

    fs::write(&kwinrc, "[Windows]\nFocusPolicy = \"FocusFollowsMouse\"\n").unwrap();
    b.watcher().trigger(&kwinrc);
    assert!(b.process_events(&mut ctx).unwrap());
    assert_eq!(ctx.get(&id).unwrap().as_bool(), Some(false));
}

#[test]
fn shortcuts_round_trip_through_the_key_binding_store() {
    let dir = tempfile::tempdir().unwrap();
    let id = SettingId::display("core", "close_window_key");
    let mut ctx = SettingsContext::new("");
    ctx.add(Setting::key(id.clone(), KeyBinding::default()));
    set(&mut ctx, &id, Value::Key(KeyBinding::new("F4", Modifiers::CONTROL | Modifiers::ALT)));

    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.write_all(&ctx).unwrap();

    set(&mut ctx, &id, Value::Key(KeyBinding::default()));
    b.read_all(&mut ctx).unwrap();
    assert_eq!(
        ctx.get(&id).unwrap().as_key(),
        Some(&KeyBinding::new("F4", Modifiers::CONTROL | Modifiers::ALT))
    );
}

#[test]
fn nested_pass_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SettingsContext::new("");
    let (mut b, _bus) = backend(dir.path(), &ctx);
    b.read_init(&ctx).unwrap();
    assert!(matches!(b.write_init(&ctx), Err(kconfig_bridge::BridgeError::PassActive)));
    b.read_done();
    b.fini();
}
