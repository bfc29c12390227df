//! VPC and private subnet lookups.

use serde_json::json;

use crate::terraform::{Address, Block, Stack};

/// Subnets whose `Name` tag matches this pattern are treated as private.
pub const PRIVATE_SUBNET_PATTERN: &str = "*priv*";

/// Handle on the data sources describing one VPC.
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc_id: String,
    pub vpc: Address,
    pub subnets: Address,
}

impl Network {
    /// Declare the VPC and subnet lookups. A VPC shared by several projects is looked up once.
    pub fn lookup(stack: &mut Stack, vpc_id: &str) -> Self {
        let vpc = stack.ensure(Block::data("aws_vpc", &format!("vpc-{}", vpc_id)).attr("id", vpc_id));
        let subnets = stack.ensure(
            Block::data("aws_subnets", &format!("subnets-{}", vpc_id)).attr(
                "filter",
                json!([
                    { "name": "vpc-id", "values": [vpc.attr("id")] },
                    { "name": "tag:Name", "values": [PRIVATE_SUBNET_PATTERN] },
                ]),
            ),
        );
        Self {
            vpc_id: vpc_id.to_string(),
            vpc,
            subnets,
        }
    }

    pub fn subnet_ids(&self) -> String {
        self.subnets.attr("ids")
    }

    pub fn cidr_block(&self) -> String {
        self.vpc.attr("cidr_block")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_declares_vpc_and_subnets() {
        let mut stack = Stack::new("test");
        let network = Network::lookup(&mut stack, "vpc-0abc");
        assert_eq!(network.subnet_ids(), "${data.aws_subnets.subnets-vpc-0abc.ids}");
        assert_eq!(network.cidr_block(), "${data.aws_vpc.vpc-vpc-0abc.cidr_block}");

        let subnets = stack.get(&network.subnets).unwrap();
        let filters = subnets.get("filter").unwrap();
        assert_eq!(filters[0]["values"][0], "${data.aws_vpc.vpc-vpc-0abc.id}");
        assert_eq!(filters[1]["name"], "tag:Name");
        assert_eq!(filters[1]["values"][0], "*priv*");
    }

    #[test]
    fn test_shared_vpc_is_looked_up_once() {
        let mut stack = Stack::new("test");
        Network::lookup(&mut stack, "vpc-1");
        Network::lookup(&mut stack, "vpc-1");
        assert_eq!(stack.len(), 2);
    }
}
