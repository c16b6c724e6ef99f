// tests/spec_properties.rs

use proptest::prelude::*;

use podstep::pod::DEFAULT_SECRET_MOUNT_PATH;
use podstep::pod::build_pod;
use podstep::pod::fingerprint::spec_fingerprint;
use podstep::pod::model::{Container, Pod, PodExt, Volume, VolumeMount};
use podstep::{JobSpec, PodStepConfiguration};
use podstep_test_utils::builders::{JobSpecBuilder, PodStepConfigurationBuilder};

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

fn optional(value: impl Strategy<Value = String>) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        value.prop_map(Some),
    ]
}

fn mount_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(ident(), 1..4).prop_map(|parts| format!("/{}", parts.join("/")))
}

fn container(pod: &Pod) -> &Container {
    &pod.spec.as_ref().expect("pod has a spec").containers[0]
}

fn volumes(pod: &Pod) -> &[Volume] {
    pod.spec.as_ref().and_then(|s| s.volumes.as_deref()).unwrap_or_default()
}

fn mounts(pod: &Pod) -> &[VolumeMount] {
    container(pod).volume_mounts.as_deref().unwrap_or_default()
}

prop_compose! {
    fn step_config()(
        as_name in ident(),
        commands in "[ -~]{1,40}",
        secret in optional(ident()),
        mount in optional(mount_path()),
        artifacts in optional(mount_path()),
    ) -> PodStepConfiguration {
        let mut config = PodStepConfigurationBuilder::new(&as_name, &commands).build();
        config.secret_name = secret;
        config.secret_mount_path = mount;
        config.artifact_dir = artifacts;
        config
    }
}

prop_compose! {
    fn job_spec()(
        namespace in ident(),
        job in ident(),
        build_id in ident(),
    ) -> JobSpec {
        JobSpecBuilder::new(&namespace)
            .job(&job)
            .build_id(&build_id)
            .prow_job_id("prow-job-id")
            .build()
    }
}

proptest! {
    #[test]
    fn build_pod_is_deterministic(step in ident(), config in step_config(), job in job_spec()) {
        let first = build_pod(&step, &config, &job).unwrap();
        let second = build_pod(&step, &config, &job).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(spec_fingerprint(&first).unwrap(), spec_fingerprint(&second).unwrap());
    }

    #[test]
    fn secret_mounts_follow_secret_name(step in ident(), config in step_config(), job in job_spec()) {
        let pod = build_pod(&step, &config, &job).unwrap();
        let mounts = mounts(&pod);
        let volumes = volumes(&pod);

        match config.secret_name.as_deref().filter(|s| !s.is_empty()) {
            None => {
                prop_assert!(volumes.is_empty());
                prop_assert!(mounts.is_empty());
            }
            Some(secret) => {
                let expected_path = config
                    .secret_mount_path
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .unwrap_or(DEFAULT_SECRET_MOUNT_PATH);

                prop_assert_eq!(volumes.len(), 1);
                prop_assert_eq!(mounts.len(), 1);
                prop_assert_eq!(&volumes[0].name, secret);
                prop_assert_eq!(&mounts[0].mount_path, expected_path);
                prop_assert_eq!(mounts[0].read_only, Some(true));
                prop_assert_eq!(mounts[0].sub_path.as_deref(), expected_path.rsplit('/').next());
            }
        }
    }

    #[test]
    fn pod_identity_comes_from_config_and_job(step in ident(), config in step_config(), job in job_spec()) {
        let pod = build_pod(&step, &config, &job).unwrap();

        prop_assert_eq!(pod.name(), config.as_name.as_str());
        prop_assert_eq!(pod.namespace(), job.namespace.as_str());
        prop_assert_eq!(pod.spec.as_ref().map(|s| s.containers.len()), Some(1));
        prop_assert_eq!(&container(&pod).name, &step);
        prop_assert_eq!(
            pod.metadata.labels.as_ref().and_then(|l| l.get("build-id")),
            Some(&job.build_id)
        );
        let command = container(&pod).command.as_deref().unwrap_or_default();
        prop_assert!(command[2].ends_with(&config.commands));
    }
}
