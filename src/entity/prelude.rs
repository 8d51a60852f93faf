//! 预导入模块，方便使用

pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::participants::{
    ActiveModel as ParticipantActiveModel, Entity as Participants, Model as ParticipantModel,
};
pub use super::review_dependents::{
    ActiveModel as ReviewDependentActiveModel, Entity as ReviewDependents,
    Model as ReviewDependentModel,
};
pub use super::review_mappings::{
    ActiveModel as ReviewMappingActiveModel, Entity as ReviewMappings, Model as ReviewMappingModel,
};
pub use super::signed_up_teams::{
    ActiveModel as SignedUpTeamActiveModel, Entity as SignedUpTeams, Model as SignedUpTeamModel,
};
pub use super::team_members::{
    ActiveModel as TeamMemberActiveModel, Entity as TeamMembers, Model as TeamMemberModel,
};
pub use super::teams::{ActiveModel as TeamActiveModel, Entity as Teams, Model as TeamModel};
pub use super::topics::{ActiveModel as TopicActiveModel, Entity as Topics, Model as TopicModel};
