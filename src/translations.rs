use std::collections::HashMap;
use std::sync::LazyLock;

use crate::insights::InsightKey;

type LanguageTable = HashMap<InsightKey, &'static str>;

static TRANSLATIONS: LazyLock<HashMap<&'static str, LanguageTable>> = LazyLock::new(|| {
    use InsightKey::*;

    let en = [
        (OvulationDay, "Today is your ovulation day. You are at your highest chance of getting pregnant. This is a good time to try to conceive."),
        (FertileWindow, "You are currently in your fertile window. Your chances of getting pregnant are higher during this period."),
        (HighFertility, "Your fertility signs look strong in this cycle. Continue tracking your body signs closely."),
        (LowFertility, "Your fertility level is currently low. The chance of pregnancy is reduced at this time."),
        (PostOvulation, "Ovulation has passed for this cycle. Focus on rest and overall wellbeing."),
        (PeriodExpected, "Your next period is expected soon. You may begin to notice premenstrual symptoms."),
        (PeriodDay, "Your period is expected today. Take care of your body and rest when needed."),
        (CycleNormal, "Your menstrual cycle appears normal. Keep tracking for accurate insights."),
        (Default, "Your fertile window has passed for this cycle. Continue tracking your cycle regularly."),
    ];

    let yo = [
        (OvulationDay, "Lónìí ni ọjọ́ ovulation rẹ. O wa ní akoko ìbímọ́ rẹ tó pọ̀ jù lọ. Akoko dáa niyí láti gbìyànjú oyun."),
        (FertileWindow, "O wa nínú akoko ìbímọ́ rẹ lọ́wọ́lọ́wọ́. Àǹfààní oyun rẹ ga jù lọ ní asiko yìí."),
        (HighFertility, "Àwọn ààmì ìbímọ́ rẹ dáa púpọ̀ nínú ìyípo yìí. Máa tẹ̀síwájú nínú títẹ̀lé ààmì ara rẹ."),
        (LowFertility, "Àǹfààní oyun rẹ kéré ní asiko yìí. O dáa láti tẹ̀síwájú nínú títọ́pa ìyípo rẹ."),
        (PostOvulation, "Ovulation ti kọjá fún ìyípo yìí. Sinmi dáadáa kí o sì tọ́jú ara rẹ."),
        (PeriodExpected, "Akoko oṣù rẹ ń bọ́ laipẹ́. O lè bẹ̀rẹ̀ sí rí ààmì ṣáájú oṣù."),
        (PeriodDay, "Lónìí ni ọjọ́ oṣù rẹ. Sinmi, mu omi púpọ̀, kí o sì tọ́jú ara rẹ."),
        (CycleNormal, "Ìyípo oṣù rẹ dàbí ẹni pé ó dáa. Máa tẹ̀síwájú nínú títọ́pa rẹ."),
        (Default, "Akoko ìbímọ́ rẹ ti kọjá fún ìyípo yìí. Tẹ̀síwájú nínú títọ́pa ọjọ́ oṣù rẹ."),
    ];

    let ig = [
        (OvulationDay, "Taa bụ ụbọchị ovulation gị. Ị nwere ohere kacha elu ịtụrụ ime taa. Oge a dị mma iji nwaa ime."),
        (FertileWindow, "Ị nọ ugbu a n'oge ịtụrụ ime. Ohere ịtụrụ ime ka elu n'oge a."),
        (HighFertility, "Ihe ngosi ime gị dị mma n'okirikiri a. Gaa n'ihu na-enyocha mgbaàmà gị."),
        (LowFertility, "Ohere ịtụrụ ime dị ala n'oge a. Nọgide na-enyocha okirikiri gị."),
        (PostOvulation, "Ovulation agafela n'okirikiri a. Were oge zuru ike ma lekọta ahụ gị."),
        (PeriodExpected, "Oge nsọ gị na-abịa n'oge na-adịghị anya. Ị nwere ike ịhụ mgbaàmà tupu oge nsọ."),
        (PeriodDay, "Taa bụ ụbọchị oge nsọ gị. Zuru ike ma lekọta ahụ gị nke ọma."),
        (CycleNormal, "Okirikiri nsọ gị dị ka o kwesịrị. Gaa n'ihu na-enyocha ya."),
        (Default, "Oge ịtụrụ ime agafela n'okirikiri a. Nọgide na-enyocha oge nsọ gị."),
    ];

    let ha = [
        (OvulationDay, "Yau rana ce ta ovulation. Yiwuwar samun ciki ta fi yawa yau. Wannan lokaci ne mai kyau don ƙoƙarin samun ciki."),
        (FertileWindow, "A halin yanzu kina cikin lokacin samun ciki. Yiwuwar samun ciki ta fi yawa a wannan lokaci."),
        (HighFertility, "Alamomin haihuwa sun yi kyau a wannan zagaye. Ci gaba da lura da alamunki."),
        (LowFertility, "Yiwuwar samun ciki ba ta da yawa a wannan lokaci. Ki ci gaba da lura da zagayenki."),
        (PostOvulation, "Ovulation ta wuce a wannan zagaye. Ki huta kuma ki kula da lafiyarki."),
        (PeriodExpected, "Al'adarki na gabatowa nan ba da jimawa ba. Zaki iya fara jin alamomin PMS."),
        (PeriodDay, "Yau rana ce ta al'ada. Ki huta sosai kuma ki kula da jikinki."),
        (CycleNormal, "Zagayen al'adarki yana tafiya daidai. Ki ci gaba da lura da shi."),
        (Default, "Lokacin samun ciki ya wuce a wannan zagaye. Ki ci gaba da bin diddigin al'adarki."),
    ];

    let pg = [
        (OvulationDay, "Today na your ovulation day. Your chance to get belle high well well today. E good make una try if una wan get belle."),
        (FertileWindow, "You dey your fertile window now. Your chance to get belle dey higher for this time."),
        (HighFertility, "Your fertility signs strong for this cycle. Continue to dey watch your body signs well."),
        (LowFertility, "Your fertility level low for now. Chance to get belle no too dey high this time."),
        (PostOvulation, "Ovulation don pass for this cycle. Try rest well and take care of your body."),
        (PeriodExpected, "Your next period go start soon. You fit begin notice some body changes."),
        (PeriodDay, "Your period suppose start today. Take care of yourself and rest if you need am."),
        (CycleNormal, "Your menstrual cycle dey normal. Continue to dey track am make you get correct info."),
        (Default, "Your fertile window don pass for this cycle. Continue to dey track your cycle regularly."),
    ];

    HashMap::from([
        ("en", LanguageTable::from(en)),
        ("yo", LanguageTable::from(yo)),
        ("ig", LanguageTable::from(ig)),
        ("ha", LanguageTable::from(ha)),
        ("pg", LanguageTable::from(pg)),
    ])
});

/// Resolve an insight key to text in the given language.
///
/// Unknown languages do not fall back to English; a missing entry yields the
/// key's own name so callers always get a non-empty string.
pub fn localize(key: InsightKey, language: &str) -> String {
    TRANSLATIONS
        .get(language.to_lowercase().as_str())
        .and_then(|table| table.get(&key))
        .map(|text| (*text).to_string())
        .unwrap_or_else(|| key.as_str().to_string())
}

/// Language codes that have a translation table.
pub fn supported_languages() -> Vec<&'static str> {
    let mut codes: Vec<_> = TRANSLATIONS.keys().copied().collect();
    codes.sort_unstable();
    codes
}
