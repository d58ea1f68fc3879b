//! Weekly batch plans: how many posts per pillar, which subtopics and
//! structures to rotate through, and the pillar-specific advisor guidance
//! baked into each batch prompt.

use crate::content::Account;

/// One pillar's batch in a weekly generation run.
#[derive(Debug, Clone)]
pub struct BatchSpec {
    pub category: &'static str,
    pub count: usize,
    pub subtopics: &'static [&'static str],
    pub structures: &'static [&'static str],
    pub advisor: &'static str,
}

const GROWTH_ADVISOR: &str = "\
GROWTH ADVISOR (apply 1-2 frameworks per post, INVISIBLY - never name them):
- Volume Negates Luck: the gap isn't 2x, it's 100x. 7 posts/week vs 80
- More→Better→New: first do MORE of what works, then optimize, only then try new
- Give Away Secrets, Sell Implementation: free content better than competitors' paid
- How I vs How To: \"here's what I did\" beats \"you should do X\"
- Nail It Then Scale It: 1 product, 1 avatar, 1 channel first
- Optimize Front to Back: 10x effort on the hook, 1x on the rest";

const TRADING_ADVISOR: &str = "\
TRADING ADVISOR (embed in ALL market posts):
- Strategy = 10%, Psychology = 90%. WHO uses it matters, not WHICH
- Losses Are Tax, Not Failure. cost of business
- Sniper, Not Machine Gun: right location, right conditions, one shot
- Wealth Flows from Impatient to Patient
- Casino Manager Mindset: edge over 10,000 hands, not single outcome
- Probability Mindset: balance conviction with humility. NEVER sound like a trading course";

const HUMOR_ADVISOR: &str = "\
HUMOR STRUCTURES (use 1 random structure for 2 of the shitposts):
1. Fact→Absurd Conclusion  2. X vs Y Self-Deprecating  3. Escalation/Spiral
4. List That Breaks  5. False Authority Parody  6. Expectation Reversal
7. Dictionary/Redefinition  8. Analogy from Absurd Source  9. Bait-and-Switch
10. Exaggerated Precision
RULES: lowercase, casual, self-deprecating > mocking others. if a joke needs explanation, kill it";

/// The weekly batch plan for an account. Counts sum to 42.
#[must_use]
pub fn weekly_plan(account: Account) -> Vec<BatchSpec> {
    match account {
        Account::Primary => vec![
            BatchSpec {
                category: "growth",
                count: 17,
                subtopics: &[
                    "growing X account",
                    "X analytics progress",
                    "X algorithm tips",
                    "marketing frameworks",
                    "building personal brand",
                    "importance of visuals",
                    "replying strategies",
                    "storytelling",
                    "making money in web3",
                    "writing/copywriting",
                    "AI and automation",
                    "cold reach and BD",
                    "productivity hacks",
                    "learning tips",
                    "importance of uniqueness",
                ],
                structures: &[
                    "Problem → Solution",
                    "Tutorial / How-to",
                    "Listicle",
                    "Framework / System",
                    "Hook → Body → Conclusion",
                    "Story / Narrative",
                    "Before → After",
                    "Mindset Shift",
                    "Mistake → Lesson",
                    "Question → Answer",
                    "Case Study",
                    "Contrarian View",
                    "Single Insight",
                ],
                advisor: GROWTH_ADVISOR,
            },
            BatchSpec {
                category: "market",
                count: 6,
                subtopics: &[
                    "market analysis",
                    "potential trade setups",
                    "trading mentality",
                    "winner mentality",
                    "technical analysis simplified",
                    "long-term game",
                    "risk management",
                    "no fomo approach",
                    "patience",
                ],
                structures: &[
                    "Hook → Body → Conclusion",
                    "Data Dump / Research",
                    "Framework / System",
                    "Prediction / Forecast",
                    "Breakdown / Analysis",
                    "Contrarian View",
                    "Single Insight",
                    "Observation → Pattern",
                ],
                advisor: TRADING_ADVISOR,
            },
            BatchSpec {
                category: "lifestyle",
                count: 6,
                subtopics: &[
                    "healthy food/carnivore/keto",
                    "mentality of a winner",
                    "sports (running/gym/tennis)",
                    "passion (travel/music/groundhopping)",
                    "quitting smoking milestones",
                    "yerba mate lifestyle",
                    "travel tips",
                    "learning Spanish",
                ],
                structures: &[
                    "Story / Narrative",
                    "Question → Answer",
                    "Mistake → Lesson",
                    "Single Insight",
                    "Before → After",
                    "Mindset Shift",
                ],
                advisor: "LIFESTYLE: show personality, help the audience identify. motivational but real, not fake positivity.",
            },
            BatchSpec {
                category: "busting",
                count: 6,
                subtopics: &[
                    "bad content and AI slop",
                    "scam profiles and shillers",
                    "attention whores",
                    "false prophets who flip-flop",
                    "scam projects and rugs",
                ],
                structures: &[
                    "Myth Busting",
                    "Controversy / Hot Take",
                    "Data Dump / Research",
                    "Contrarian View",
                    "Observation → Pattern",
                    "Breakdown / Analysis",
                ],
                advisor: "BUSTING: point out bad content, catch liars. direct, controversial, honest, with evidence. never punch down on small accounts.",
            },
            BatchSpec {
                category: "shitposting",
                count: 7,
                subtopics: &[
                    "reactions to crypto news",
                    "teasing CT culture",
                    "smart observations",
                    "jokes using humor structures",
                    "random vibes/internet culture",
                ],
                structures: &[
                    "Controversy / Hot Take",
                    "Myth Busting",
                    "Single Insight",
                    "Observation → Pattern",
                    "Comparison / VS",
                ],
                advisor: HUMOR_ADVISOR,
            },
        ],
        Account::Secondary => vec![
            BatchSpec {
                category: "market",
                count: 13,
                subtopics: &[
                    "analiza rynku crypto",
                    "tłumaczenie zagranicznych newsów",
                    "mentalność tradera",
                    "dlaczego projekty upadają",
                    "scamy i manipulacje",
                    "no fomo approach",
                    "cierpliwość",
                    "nowe narracje i trendy",
                    "płynność i struktura rynku",
                ],
                structures: &[
                    "Hook → Body → Conclusion",
                    "Breakdown / Analysis",
                    "Contrarian View",
                    "Single Insight",
                    "Observation → Pattern",
                    "Comparison / VS",
                    "Question → Answer",
                ],
                advisor: "MARKET: tłumacz i komentuj międzynarodowe newsy crypto dla polskiej publiki. bez hype, punktuj scamy. NIE robimy analizy technicznej ani trade setupów.",
            },
            BatchSpec {
                category: "busting",
                count: 6,
                subtopics: &[
                    "scamy i fałszywe projekty",
                    "fałszywi prorocy i flip-floperzy",
                    "ludzka głupota w internecie",
                    "AI slop i złe treści",
                    "polityka i absurdy świata",
                ],
                structures: &[
                    "Controversy / Hot Take",
                    "Breakdown / Analysis",
                    "Contrarian View",
                    "Observation → Pattern",
                    "Myth Busting",
                ],
                advisor: "BUSTING: punktuj głupotę, scamy, fałszywych proroków. bezpośrednio, z dowodami.",
            },
            BatchSpec {
                category: "shitposting",
                count: 6,
                subtopics: &[
                    "reakcje na bieżące wydarzenia",
                    "obserwacje ze świata",
                    "żarty z internetu i kultury",
                    "absurdy codzienności",
                ],
                structures: &[
                    "Controversy / Hot Take",
                    "Single Insight",
                    "Observation → Pattern",
                    "Comparison / VS",
                    "Myth Busting",
                ],
                advisor: HUMOR_ADVISOR,
            },
            BatchSpec {
                category: "growth",
                count: 6,
                subtopics: &[
                    "rozwój profilu na X",
                    "budowanie marki osobistej",
                    "strategie replying",
                    "storytelling i hooki",
                    "zarabianie w web3",
                    "marketing i pozycjonowanie",
                ],
                structures: &[
                    "Problem → Solution",
                    "Story / Narrative",
                    "Listicle",
                    "Framework / System",
                    "Mindset Shift",
                    "Contrarian View",
                ],
                advisor: GROWTH_ADVISOR,
            },
            BatchSpec {
                category: "ai",
                count: 6,
                subtopics: &[
                    "AI zastępuje pracowników",
                    "praktyczne narzędzia AI",
                    "przyszłość marketingu z AI",
                    "zagrożenia AI dla biznesu",
                    "jak przygotować się na AI",
                ],
                structures: &[
                    "Hook → Body → Conclusion",
                    "Story / Narrative",
                    "Contrarian View",
                    "Single Insight",
                    "Breakdown / Analysis",
                    "Prediction / Forecast",
                ],
                advisor: "AI: pokazuj praktyczne zastosowania, dyskutuj wpływ na rynek pracy. balansuj ekscytację z realistycznymi obawami.",
            },
            BatchSpec {
                category: "lifestyle",
                count: 5,
                subtopics: &[
                    "biohacking i sen",
                    "sport i siłownia",
                    "motywacja i mindset",
                    "polska jest piękna",
                    "zdrowie jako priorytet",
                ],
                structures: &[
                    "Story / Narrative",
                    "Single Insight",
                    "Observation → Pattern",
                    "Mindset Shift",
                ],
                advisor: "LIFESTYLE: osobisty, autentyczny, praktyczny. nie wymuszony optymizm.",
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plans_sum_to_42() {
        for account in [Account::Primary, Account::Secondary] {
            let total: usize = weekly_plan(account).iter().map(|b| b.count).sum();
            assert_eq!(total, 42);
        }
    }

    #[test]
    fn test_plan_categories_belong_to_account() {
        for account in [Account::Primary, Account::Secondary] {
            for batch in weekly_plan(account) {
                assert!(
                    account.pillars().contains(&batch.category),
                    "{} not a pillar of {:?}",
                    batch.category,
                    account
                );
            }
        }
    }
}
