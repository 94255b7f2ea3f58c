//! Bootstrap user-data script rendering.
//!
//! The script is the instance's cloud-init payload: it prepares the `devpod`
//! login user and, when a persistent volume is attached, formats and mounts
//! the volume at the user's home directory and relocates the Docker data
//! root onto it. The payload is plain POSIX shell assembled by string
//! substitution; it is deliberately not a templating engine.

use shell_escape::unix::escape;

use crate::gateway::Volume;

/// Login user created on every workspace instance.
pub const BOOTSTRAP_USER: &str = "devpod";
/// Home directory of the bootstrap user; mount point for the volume.
pub const BOOTSTRAP_HOME: &str = "/home/devpod";
/// Docker data root relocated onto the persistent volume.
const DOCKER_DATA_ROOT: &str = "/home/devpod/.docker-data";
/// Volume ids surface in virtio disk serials truncated to this length.
const DEVICE_ID_FRAGMENT_LEN: usize = 20;

/// Returns the stable device path of an attached volume.
///
/// Attached volumes appear under `/dev/disk/by-id` with a virtio serial
/// carrying the leading fragment of the volume id.
#[must_use]
pub fn volume_device_path(volume_id: &str) -> String {
    let fragment: String = volume_id.chars().take(DEVICE_ID_FRAGMENT_LEN).collect();
    format!("/dev/disk/by-id/virtio-{fragment}")
}

/// Renders the cloud-init user-data script for a new instance.
///
/// The volume block, when present, runs before user creation so the home
/// directory already sits on the mounted volume when it is populated.
#[must_use]
pub fn build_bootstrap_script(public_key: &str, volume: Option<&Volume>) -> String {
    let mut script = String::from("#!/bin/sh\n");
    if let Some(volume) = volume {
        script.push_str(&volume_setup(volume));
    }
    script.push_str(&user_setup(public_key.trim()));
    script
}

fn volume_setup(volume: &Volume) -> String {
    let device = volume_device_path(&volume.id);
    format!(
        r#"DEVICE="{device}"
if ! blkid "$DEVICE" >/dev/null 2>&1; then
	mkfs.ext4 "$DEVICE"
fi
mkdir -p {home}
mount "$DEVICE" {home}
if command -v dockerd >/dev/null 2>&1; then
	systemctl stop docker
	mkdir -p /etc/docker
	echo '{{"data-root": "{data_root}"}}' > /etc/docker/daemon.json
	chattr +i /etc/docker/daemon.json
	chattr +i /etc/docker
	if [ ! -e {data_root} ]; then
		cp -a /var/lib/docker {data_root}
	fi
	systemctl start docker
fi
"#,
        device = device,
        home = BOOTSTRAP_HOME,
        data_root = DOCKER_DATA_ROOT,
    )
}

fn user_setup(public_key: &str) -> String {
    let escaped_key = escape(public_key.into());
    format!(
        r#"useradd {user} -d {home}
mkdir -p {home}
if grep -q sudo /etc/group; then
	usermod -aG sudo {user}
elif grep -q wheel /etc/group; then
	usermod -aG wheel {user}
fi
echo "{user} ALL=(ALL) NOPASSWD:ALL" > /etc/sudoers.d/91-{user}
mkdir -p {home}/.ssh
echo {key} >> {home}/.ssh/authorized_keys
chmod 0700 {home}/.ssh
chmod 0600 {home}/.ssh/authorized_keys
chown -R {user}:{user} {home}
"#,
        user = BOOTSTRAP_USER,
        home = BOOTSTRAP_HOME,
        key = escaped_key,
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3Nza devpod@host";

    fn volume() -> Volume {
        Volume {
            id: String::from("0123456789abcdef0123-rest-is-truncated"),
            name: String::from("devpod-abc123"),
            size_gb: 20,
            network_id: String::from("net-1"),
        }
    }

    #[rstest]
    #[case(
        "0123456789abcdef0123-rest-is-truncated",
        "/dev/disk/by-id/virtio-0123456789abcdef0123"
    )]
    #[case("short", "/dev/disk/by-id/virtio-short")]
    #[case("", "/dev/disk/by-id/virtio-")]
    fn device_path_uses_the_leading_id_fragment(#[case] volume_id: &str, #[case] expected: &str) {
        assert_eq!(volume_device_path(volume_id), expected);
    }

    #[test]
    fn script_installs_the_key_with_owner_only_permissions() {
        let script = build_bootstrap_script(PUBLIC_KEY, None);

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("useradd devpod -d /home/devpod"));
        assert!(script.contains("echo \"devpod ALL=(ALL) NOPASSWD:ALL\" > /etc/sudoers.d/91-devpod"));
        assert!(script.contains("echo 'ssh-ed25519 AAAAC3Nza devpod@host' >> /home/devpod/.ssh/authorized_keys"));
        assert!(script.contains("chmod 0700 /home/devpod/.ssh"));
        assert!(script.contains("chmod 0600 /home/devpod/.ssh/authorized_keys"));
        assert!(script.contains("chown -R devpod:devpod /home/devpod"));
    }

    #[test]
    fn script_without_volume_never_formats_or_mounts() {
        let script = build_bootstrap_script(PUBLIC_KEY, None);

        assert!(!script.contains("mkfs.ext4"));
        assert!(!script.contains("mount "));
        assert!(!script.contains("docker"));
    }

    #[test]
    fn script_with_volume_formats_only_unformatted_devices() {
        let script = build_bootstrap_script(PUBLIC_KEY, Some(&volume()));

        assert!(script.contains("DEVICE=\"/dev/disk/by-id/virtio-0123456789abcdef0123\""));
        assert!(script.contains("if ! blkid \"$DEVICE\""));
        assert!(script.contains("mkfs.ext4 \"$DEVICE\""));
        assert!(script.contains("mount \"$DEVICE\" /home/devpod"));
    }

    #[test]
    fn script_with_volume_relocates_docker_data_exactly_once() {
        let script = build_bootstrap_script(PUBLIC_KEY, Some(&volume()));

        assert!(script.contains("systemctl stop docker"));
        assert!(script.contains("echo '{\"data-root\": \"/home/devpod/.docker-data\"}' > /etc/docker/daemon.json"));
        assert!(script.contains("chattr +i /etc/docker/daemon.json"));
        assert!(script.contains("chattr +i /etc/docker"));
        assert!(script.contains("if [ ! -e /home/devpod/.docker-data ]; then"));
        assert!(script.contains("cp -a /var/lib/docker /home/devpod/.docker-data"));
        assert!(script.contains("systemctl start docker"));
    }

    #[test]
    fn volume_block_runs_before_user_creation() {
        let script = build_bootstrap_script(PUBLIC_KEY, Some(&volume()));

        let mount_at = script.find("mount \"$DEVICE\"").unwrap_or_else(|| panic!("mount missing"));
        let useradd_at = script.find("useradd devpod").unwrap_or_else(|| panic!("useradd missing"));
        assert!(mount_at < useradd_at, "volume setup must precede user setup");
    }
}
