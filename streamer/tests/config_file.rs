use fibre_streamer::{ConfigError, StreamerBuilder, StreamerConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;

#[test]
fn builds_a_device_from_a_yaml_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  writeln!(file, "capacity: 32").unwrap();
  writeln!(file, "refill_timeout: 15ms").unwrap();
  writeln!(file, "producer_thread_name: yaml-producer").unwrap();

  let config = StreamerConfig::from_file(file.path()).unwrap();
  assert_eq!(
    config,
    StreamerConfig {
      capacity: 32,
      refill_timeout: Duration::from_millis(15),
      producer_thread_name: "yaml-producer".to_string(),
    }
  );

  let device = StreamerBuilder::from_config(&config).build().unwrap();
  assert_eq!(device.capacity(), 32);
  let mut handle = device.open().unwrap();
  let mut buf = [0u8; 64];
  assert_eq!(handle.read(&mut buf).unwrap(), 32);
}

#[test]
fn missing_file_is_a_read_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = StreamerConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
  assert!(matches!(err, ConfigError::Read(_)));
}

#[test]
fn zero_timeout_is_invalid() {
  let err = StreamerConfig::from_yaml_str("refill_timeout: 0s").unwrap_err();
  assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "refill_timeout"));
}
