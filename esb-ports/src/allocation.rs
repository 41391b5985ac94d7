//! MD5-based subnet allocation.

use md5::{Digest, Md5};
use serde::Serialize;
use std::net::Ipv4Addr;

use crate::subnet::Subnet;

pub const DEFAULT_ENV: &str = "default";

const EXTERNAL_DEFAULT_INDEX: u8 = 50;
const EXTERNAL_BASE: u8 = 60;
const RUNTIME_DEFAULT_INDEX: u8 = 20;
const RUNTIME_BASE: u8 = 100;
const INDEX_SPREAD: u32 = 100;
const RUNTIME_NODE_HOST: u32 = 10;

/// MD5 digest of `value`, read as a big-endian unsigned integer, reduced modulo `modulus`.
///
/// Reducing byte by byte gives the same result as the full 128-bit integer, so values
/// match any other implementation of the scheme exactly.
pub fn hash_mod(value: &str, modulus: u32) -> u32 {
    if modulus == 0 {
        return 0;
    }
    let digest = Md5::digest(value.as_bytes());
    let modulus = u64::from(modulus);
    let reduced = digest
        .iter()
        .fold(0u64, |acc, byte| (acc * 256 + u64::from(*byte)) % modulus);
    reduced as u32
}

/// Second octet of the external subnet `172.X.0.0/16`.
pub fn external_subnet_index(env: &str) -> u8 {
    if env == DEFAULT_ENV {
        return EXTERNAL_DEFAULT_INDEX;
    }
    EXTERNAL_BASE + hash_mod(env, INDEX_SPREAD) as u8
}

/// Second octet of the runtime-node subnet `172.X.0.0/16`.
pub fn runtime_subnet_index(env: &str) -> u8 {
    if env == DEFAULT_ENV {
        return RUNTIME_DEFAULT_INDEX;
    }
    RUNTIME_BASE + hash_mod(env, INDEX_SPREAD) as u8
}

/// Networks derived for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPlan {
    pub external_subnet: Subnet,
    pub runtime_subnet: Subnet,
    pub runtime_node_ip: Ipv4Addr,
    /// `{compose_project}-external`
    pub external_network: String,
    /// `{brand}_int_{env}`
    pub lambda_network: String,
}

impl NetworkPlan {
    pub fn derive(brand: &str, env: &str, compose_project: &str) -> Self {
        let runtime_subnet = Subnet::private_b(runtime_subnet_index(env));
        NetworkPlan {
            external_subnet: Subnet::private_b(external_subnet_index(env)),
            runtime_node_ip: runtime_subnet.host(RUNTIME_NODE_HOST),
            runtime_subnet,
            external_network: format!("{}-external", compose_project),
            lambda_network: format!("{}_int_{}", brand, env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distr::Alphanumeric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_hash_mod_matches_md5_integer() {
        // md5("staging") = 830f78e090fe8aec00891405dfc14824
        assert_eq!(hash_mod("staging", 100), 28);
        assert_eq!(hash_mod("dev", 100), 22);
        assert_eq!(hash_mod("prod", 100), 79);
        assert_eq!(hash_mod("anything", 0), 0);
    }

    #[test]
    fn test_default_env_uses_fixed_indices() {
        assert_eq!(external_subnet_index("default"), 50);
        assert_eq!(runtime_subnet_index("default"), 20);
    }

    #[test]
    fn test_indices_stay_in_their_bands() {
        for i in 0..500 {
            let env = format!("env-{}", i);
            assert!((60..160).contains(&external_subnet_index(&env)));
            assert!((100..200).contains(&runtime_subnet_index(&env)));
        }
    }

    #[test]
    fn test_staging_plan_golden() {
        let plan = NetworkPlan::derive("demo", "staging", "demo-staging");
        assert_eq!(plan.external_subnet.to_string(), "172.88.0.0/16");
        assert_eq!(plan.runtime_subnet.to_string(), "172.128.0.0/16");
        assert_eq!(plan.runtime_node_ip, Ipv4Addr::new(172, 128, 0, 10));
        assert_eq!(plan.external_network, "demo-staging-external");
        assert_eq!(plan.lambda_network, "demo_int_staging");
    }

    /// `count` distinct random environment names, never `default`.
    fn random_env_names(rng: &mut StdRng, count: usize) -> Vec<String> {
        let mut names = HashSet::new();
        while names.len() < count {
            let len = rng.random_range(3..16);
            let name: String = (&mut *rng)
                .sample_iter(Alphanumeric)
                .take(len)
                .map(char::from)
                .collect::<String>()
                .to_lowercase();
            if name != DEFAULT_ENV {
                names.insert(name);
            }
        }
        names.into_iter().collect()
    }

    #[test]
    fn test_distinct_names_rarely_collide() {
        // 100 buckets: a uniform hash leaves about 1% of pairs sharing an index.
        let mut pairs = 0usize;
        let mut distinct = 0usize;
        for seed in [1u64, 7, 42, 2024] {
            let mut rng = StdRng::seed_from_u64(seed);
            let names = random_env_names(&mut rng, 150);
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    pairs += 1;
                    let differs = external_subnet_index(a) != external_subnet_index(b)
                        && runtime_subnet_index(a) != runtime_subnet_index(b);
                    if differs {
                        distinct += 1;
                    }
                }
            }
        }
        let rate = distinct as f64 / pairs as f64;
        assert!(rate >= 0.985, "distinct rate {} below 0.985", rate);
    }

    #[test]
    fn test_default_never_shares_subnets_with_hashed_envs() {
        let default = NetworkPlan::derive("esb", "default", "esb-default");
        let mut seen: HashMap<u8, String> = HashMap::new();
        for i in 0..200 {
            let env = format!("feature-{}", i);
            let plan = NetworkPlan::derive("esb", &env, &format!("esb-{}", env));
            assert_ne!(plan.external_subnet, default.external_subnet);
            assert_ne!(plan.runtime_subnet, default.runtime_subnet);
            seen.entry(runtime_subnet_index(&env)).or_insert(env);
        }
        // Spread over the band rather than clustering.
        assert!(seen.len() > 75);
    }
}
