//! Cross-account role letting external-dns manage records in the cluster's hosted zone.
//!
//! Everything here lives in the networking account: the OIDC identity provider
//! for the cluster's issuer, the private hosted zone lookup, the role trusting
//! the external-dns service account, and its Route 53 policy.

use serde_json::json;

use crate::eks::Cluster;
use crate::error::{Result, StackError};
use crate::infra::Environment;
use crate::providers::{self, NETWORKING_ACCOUNT};
use crate::terraform::{Address, Block, Stack};

pub const EXTERNAL_DNS_SUBJECT: &str = "system:serviceaccount:external-dns-system:external-dns";
pub const STS_CLIENT_ID: &str = "sts.amazonaws.com";

/// Blocks declared for one cluster's DNS role.
#[derive(Debug, Clone)]
pub struct DnsRole {
    pub identity_provider: Address,
    pub zone: Address,
    pub role: Address,
    pub policy: Address,
}

pub fn role_name(cluster_name: &str) -> String {
    format!("EPOCrossAccountExternalDNSRole{}", cluster_name)
}

/// Trust policy allowing only the external-dns service account to assume the role.
fn trust_policy(cluster: &Cluster) -> Result<String> {
    let issuer = cluster.oidc_provider();
    let document = json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {
                "Federated": format!("arn:aws:iam::{}:oidc-provider/{}", NETWORKING_ACCOUNT, issuer),
            },
            "Action": "sts:AssumeRoleWithWebIdentity",
            "Condition": {
                "StringEquals": {
                    format!("{}:sub", issuer): EXTERNAL_DNS_SUBJECT,
                }
            }
        }]
    });
    serde_json::to_string(&document).map_err(StackError::Render)
}

fn access_policy(zone: &Address) -> Result<String> {
    let document = json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Action": [
                    "route53:ChangeResourceRecordSets",
                    "route53:ListResourceRecordSets",
                ],
                "Effect": "Allow",
                "Resource": [zone.attr("arn")],
            },
            {
                "Action": ["route53:ListHostedZones"],
                "Effect": "Allow",
                "Resource": "*",
            },
        ]
    });
    serde_json::to_string(&document).map_err(StackError::Render)
}

/// Declare the DNS role for `cluster`, scoped to the zone of `environment`.
pub fn build(stack: &mut Stack, cluster: &Cluster, environment: Environment) -> Result<DnsRole> {
    let name = cluster.name.as_str();
    let networking = providers::networking(stack);

    let identity_provider = stack.add(
        Block::resource(
            "aws_iam_openid_connect_provider",
            &format!("identity-provider-{}", name),
        )
        .provider(&networking)
        .attr("url", format!("https://{}", cluster.oidc_provider()))
        .attr("client_id_list", json!([STS_CLIENT_ID])),
    )?;

    let zone = stack.add(
        Block::data("aws_route53_zone", &format!("zone-{}", name))
            .provider(&networking)
            .attr("name", environment.hosted_zone())
            .attr("private_zone", true)
            .depends_on(&cluster.address),
    )?;

    let role = stack.add(
        Block::resource(
            "aws_iam_role",
            &format!("cross-account-external-dns-role-{}", name),
        )
        .provider(&networking)
        .attr("name", role_name(name))
        .attr("assume_role_policy", trust_policy(cluster)?)
        .depends_on(&cluster.address)
        .depends_on(&identity_provider),
    )?;

    let policy = stack.add(
        Block::resource("aws_iam_role_policy", &format!("route53-access-{}", name))
            .provider(&networking)
            .attr("role", role.attr("id"))
            .attr("policy", access_policy(&zone)?),
    )?;

    Ok(DnsRole {
        identity_provider,
        zone,
        role,
        policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eks::cluster;
    use crate::network::Network;

    fn declare(cluster_name: &str) -> (Stack, DnsRole) {
        let mut stack = Stack::new("test");
        let network = Network::lookup(&mut stack, "vpc-1");
        let environment = Environment::from_cluster(cluster_name);
        let cluster =
            cluster::build(&mut stack, cluster_name, "1.30", "demo", environment, &network).unwrap();
        let role = build(&mut stack, &cluster, environment).unwrap();
        (stack, role)
    }

    #[test]
    fn test_zone_by_environment() {
        for (cluster, zone) in [
            ("np-demo", "platform-staging.aws.internal.epo.org"),
            ("p-demo", "platform.aws.internal.epo.org"),
            ("lab-demo", "platform-lab.aws.internal.epo.org"),
        ] {
            let (stack, role) = declare(cluster);
            assert_eq!(stack.get(&role.zone).unwrap().get("name").unwrap(), zone);
        }
    }

    #[test]
    fn test_trust_policy_scoped_to_external_dns() {
        let (stack, role) = declare("np-demo");
        let block = stack.get(&role.role).unwrap();
        assert_eq!(block.get("name").unwrap(), "EPOCrossAccountExternalDNSRolenp-demo");
        assert_eq!(block.provider_ref().unwrap().to_string(), "aws.networking");

        let policy: serde_json::Value =
            serde_json::from_str(block.get("assume_role_policy").unwrap().as_str().unwrap()).unwrap();
        let statement = &policy["Statement"][0];
        assert_eq!(
            statement["Principal"]["Federated"],
            "arn:aws:iam::733565320759:oidc-provider/${module.np-demo.oidc_provider}"
        );
        assert_eq!(
            statement["Condition"]["StringEquals"]["${module.np-demo.oidc_provider}:sub"],
            EXTERNAL_DNS_SUBJECT
        );
    }

    #[test]
    fn test_access_policy() {
        let (stack, role) = declare("np-demo");
        let block = stack.get(&role.policy).unwrap();
        assert_eq!(
            block.get("role").unwrap(),
            "${aws_iam_role.cross-account-external-dns-role-np-demo.id}"
        );
        let policy: serde_json::Value =
            serde_json::from_str(block.get("policy").unwrap().as_str().unwrap()).unwrap();
        assert_eq!(policy["Statement"][0]["Resource"][0], "${data.aws_route53_zone.zone-np-demo.arn}");
        assert_eq!(policy["Statement"][1]["Resource"], "*");
    }

    #[test]
    fn test_identity_provider() {
        let (stack, role) = declare("np-demo");
        let block = stack.get(&role.identity_provider).unwrap();
        assert_eq!(block.get("url").unwrap(), "https://${module.np-demo.oidc_provider}");
        assert_eq!(block.get("client_id_list").unwrap()[0], "sts.amazonaws.com");
        assert!(stack.validate().is_ok());
    }
}
