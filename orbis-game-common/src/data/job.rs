use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobType {
    Explorer,
    Cygnus,
    Legend,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash, FromPrimitive,
)]
#[repr(u16)]
pub enum Job {
    #[default]
    Beginner = 0,

    Swordsman = 100,
    Fighter = 110,
    Crusader = 111,
    Hero = 112,
    Page = 120,
    WhiteKnight = 121,
    Paladin = 122,
    Spearman = 130,
    Berserker = 131,
    DarkKnight = 132,

    Magician = 200,
    FireWizard = 210,
    FireMage = 211,
    FireArchMage = 212,
    IceWizard = 220,
    IceMage = 221,
    IceArchMage = 222,
    Cleric = 230,
    Priest = 231,
    Bishop = 232,

    Archer = 300,
    Hunter = 310,
    Ranger = 311,
    BowMaster = 312,
    Crossbowman = 320,
    Sniper = 321,
    Marksman = 322,

    Rogue = 400,
    Assassin = 410,
    Hermit = 411,
    NightLord = 412,
    Bandit = 420,
    ChiefBandit = 421,
    Shadower = 422,

    Pirate = 500,
    Brawler = 510,
    Marauder = 511,
    Buccaneer = 512,
    Gunslinger = 520,
    Outlaw = 521,
    Corsair = 522,

    Gm = 900,
    SuperGm = 910,

    Noblesse = 1000,
    DawnWarrior = 1100,
    DawnWarrior1 = 1110,
    DawnWarrior2 = 1111,
    DawnWarrior3 = 1112,
    BlazeWizard = 1200,
    BlazeWizard1 = 1210,
    BlazeWizard2 = 1211,
    BlazeWizard3 = 1212,
    WindArcher = 1300,
    WindArcher1 = 1310,
    WindArcher2 = 1311,
    WindArcher3 = 1312,
    NightWalker = 1400,
    NightWalker1 = 1410,
    NightWalker2 = 1411,
    NightWalker3 = 1412,
    ThunderBreaker = 1500,
    ThunderBreaker1 = 1510,
    ThunderBreaker2 = 1511,
    ThunderBreaker3 = 1512,

    Legend = 2000,
    Evan = 2001,
    Aran = 2100,
    Aran1 = 2110,
    Aran2 = 2111,
    Aran3 = 2112,
    Evan1 = 2200,
    Evan2 = 2210,
    Evan3 = 2211,
    Evan4 = 2212,
    Evan5 = 2213,
    Evan6 = 2214,
    Evan7 = 2215,
    Evan8 = 2216,
    Evan9 = 2217,
    Evan10 = 2218,
}

impl Job {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn job_type(self) -> JobType {
        match self.id() / 1000 {
            0 => JobType::Explorer,
            1 => JobType::Cygnus,
            _ => JobType::Legend,
        }
    }

    /// Whether this job sits inside the advancement tree rooted at `base`.
    pub fn is_a(self, base: Job) -> bool {
        let job = self.id();
        let base = base.id();
        (job / 10 == base / 10 && job >= base)
            || ((base / 10) % 10 == 0 && job / 100 == base / 100)
    }
}

impl From<Job> for u16 {
    fn from(job: Job) -> u16 {
        job.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancement_tree_membership() {
        assert!(Job::Hero.is_a(Job::Fighter));
        assert!(Job::Hero.is_a(Job::Swordsman));
        assert!(Job::Fighter.is_a(Job::Swordsman));
        assert!(!Job::Paladin.is_a(Job::Fighter));
        assert!(!Job::Fighter.is_a(Job::Hero));
        assert!(!Job::Cleric.is_a(Job::Swordsman));
    }

    #[test]
    fn job_types_split_by_thousand() {
        assert_eq!(Job::Hero.job_type(), JobType::Explorer);
        assert_eq!(Job::DawnWarrior.job_type(), JobType::Cygnus);
        assert_eq!(Job::Aran.job_type(), JobType::Legend);
    }
}
